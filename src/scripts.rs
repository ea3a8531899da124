//! Documentation about the various scripts contained herein
//!
//! - [check-facedetect](#check-facedetect)
//! - [check-redis](#check-redis)
//! - [check-supervisord](#check-supervisord)
//! - [check-uptime](#check-uptime)
//!
//! Every script prints exactly one line, `STATUS: message|perfdata`, and
//! exits 0, 1, 2 or 3 for OK, WARNING, CRITICAL or UNKNOWN. Set `RUST_LOG=debug`
//! to see what a script is doing on stderr.
//!
//! # check-facedetect
//!
//! Cross platform, only requires access to the service's HTTP port.
//!
//! ```plain
//! $ check-facedetect --help
//! check-facedetect (part of service-checks) 0.1.0
//! Query the /status endpoint of a face detection service.
//!
//! The endpoint must return a JSON object with a string `status` field. Every other field is reported as integer
//! performance data.
//!
//! USAGE:
//!     check-facedetect [FLAGS] [OPTIONS] --hostname <hostname>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -S, --use-ssl    Use HTTPS instead of HTTP
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!     -e, --expected <expected>    Go critical unless the status contains this string
//!     -H, --hostname <hostname>    The host to query
//!     -p, --port <port>            Use the following port [default: 4000]
//!     -t, --timeout <timeout>      Seconds to wait for a response. 0 means the default. [default: 10]
//! ```
//!
//! # check-redis
//!
//! Cross platform, only requires access to the redis port.
//!
//! ```plain
//! $ check-redis --help
//! check-redis (part of service-checks) 0.1.0
//! Check a redis server.
//!
//! Runs INFO against the server and checks four things: uptime, memory used, connected clients and connected slaves.
//! The overall status is the worst of the four.
//!
//! USAGE:
//!     check-redis [OPTIONS]
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!         --clients-crit <clients-crit>    Critical if clients are over [default: 2]
//!         --clients-warn <clients-warn>    Warn if clients are over [default: 1]
//!     -H, --host <host>                    The redis host to connect to [default: localhost]
//!         --mem-crit <mem-crit>            Critical if used MB is under [default: 20]
//!         --mem-warn <mem-warn>            Warn if used MB is under [default: 10]
//!     -P, --password <password>            Password to AUTH with
//!     -p, --port <port>                     [default: 6379]
//!         --slaves-crit <slaves-crit>      Critical if slaves are under [default: 0]
//!         --slaves-warn <slaves-warn>      Warn if slaves are under [default: 0]
//!     -t, --timeout <timeout>              Seconds to wait for the server. 0 means the default. [default: 10]
//!         --up-crit <up-crit>              Critical if uptime seconds is under [default: 60]
//!         --up-warn <up-warn>              Warn if uptime seconds is under [default: 900]
//!
//! Threshold directions:
//!
//!     Uptime, memory and slaves are floors: the check alerts when the value is
//!     *less* than the threshold. Clients is a ceiling: the check alerts when
//!     there are *more* clients than the threshold. All comparisons are strict.
//! ```
//!
//! # check-supervisord
//!
//! Cross platform, requires supervisord's `[inet_http_server]` to be enabled.
//!
//! ```plain
//! $ check-supervisord --help
//! check-supervisord (part of service-checks) 0.1.0
//! Check the state of every process supervisord manages.
//!
//! Any process that is starting or stopping is a warning, any process in the UNKNOWN state is unknown, and any process
//! that exited, is backing off or is fatal is critical.
//!
//! USAGE:
//!     check-supervisord [OPTIONS] --hostname <hostname>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!     -H, --hostname <hostname>    The supervisord host
//!     -P, --password <password>    Password for XML-RPC connection
//!     -p, --port <port>            Use the following port for XML-RPC connection [default: 9080]
//!     -t, --timeout <timeout>      Seconds to wait for a response. 0 means the default. [default: 10]
//!     -u, --user <user>            Username for XML-RPC connection
//! ```
//!
//! # check-uptime
//!
//! Linux-only, unless `--stdin` is used.
//!
//! ```plain
//! $ check-uptime --help
//! check-uptime (part of service-checks) 0.1.0
//! Check that the system has been up for at least some number of minutes.
//!
//! Useful for catching unexpected reboots: an uptime lower than --crit minutes is critical, lower than --warn minutes is
//! a warning.
//!
//! USAGE:
//!     check-uptime [FLAGS] --crit <crit> --warn <warn>
//!
//! FLAGS:
//!     -h, --help       Prints help information
//!         --stdin      Read the uptime from stdin instead of /proc/uptime, in the same format
//!     -V, --version    Prints version information
//!
//! OPTIONS:
//!     -c, --crit <crit>    Time in minutes that triggers a critical state
//!     -w, --warn <warn>    Time in minutes that triggers a warning state
//! ```
