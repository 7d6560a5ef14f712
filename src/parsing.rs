//! Request-line and query parsing for the control server.
//!
//! Only two request shapes are recognized: `GET /set?<query>` carries a
//! command, anything else asks for the control page. No percent-decoding is
//! done; the control page only ever sends plain integers.
//!
//! ```rust
//! use f01_rover::parsing::{CommandUpdate, Request};
//! use f01_rover::services::Command;
//!
//! let Request::Set(query) = Request::parse("GET /set?left=10&right=-5 HTTP/1.1") else {
//!     unreachable!()
//! };
//! let cmd = CommandUpdate::parse(query).apply(Command::default());
//! assert_eq!(cmd, Command { left: 10, right: -5 });
//! ```

use crate::services::Command;

/// Prefix of a command request line.
pub const SET_PREFIX: &str = "GET /set?";

/// The two kinds of request the server understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Request<'a> {
    /// `GET /set?...`, holding the raw query string.
    Set(&'a str),
    /// Anything else; answered with the control page.
    Page,
}

impl<'a> Request<'a> {
    /// Classify a request line. Trailing `\r\n` is ignored.
    pub fn parse(line: &'a str) -> Self {
        match line.trim().strip_prefix(SET_PREFIX) {
            Some(rest) => Request::Set(rest.split(' ').next().unwrap_or("")),
            None => Request::Page,
        }
    }
}

/// Split a query into `key=value` pairs.
///
/// Pairs without `=` are skipped. Only the first `=` separates, so a value
/// may itself contain `=`.
pub fn query_pairs(query: &str) -> impl Iterator<Item = (&str, &str)> {
    query.split('&').filter_map(|pair| pair.split_once('='))
}

/// Changes requested by one `/set` query.
///
/// `None` means "leave that side as it is", either because the key was absent
/// or its value did not parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandUpdate {
    /// New left speed
    pub left: Option<i32>,
    /// New right speed
    pub right: Option<i32>,
    /// `stop=1` was given; both sides go to zero
    pub stop: bool,
}

impl CommandUpdate {
    /// Parse a query. When a key repeats, its last value is the one used.
    ///
    /// Malformed integers are logged and ignored.
    pub fn parse(query: &str) -> Self {
        let mut left = None;
        let mut right = None;
        let mut stop = None;

        for (key, value) in query_pairs(query) {
            match key {
                "left" => left = Some(value),
                "right" => right = Some(value),
                "stop" => stop = Some(value),
                _ => {}
            }
        }

        Self {
            left: left.and_then(|v| parse_speed("left", v)),
            right: right.and_then(|v| parse_speed("right", v)),
            stop: stop == Some("1"),
        }
    }

    /// Apply this update on top of the current command.
    pub fn apply(&self, current: Command) -> Command {
        if self.stop {
            return Command::STOP;
        }
        Command {
            left: self.left.unwrap_or(current.left),
            right: self.right.unwrap_or(current.right),
        }
    }
}

fn parse_speed(key: &str, value: &str) -> Option<i32> {
    match value.parse() {
        Ok(speed) => Some(speed),
        Err(e) => {
            log::warn!("[HTTP] ignoring {}={:?}: {}", key, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Request line
    // =========================================================================

    #[test]
    fn set_request_extracts_query() {
        assert_eq!(
            Request::parse("GET /set?left=10&right=-5 HTTP/1.1\r\n"),
            Request::Set("left=10&right=-5")
        );
    }

    #[test]
    fn set_request_without_version() {
        assert_eq!(Request::parse("GET /set?left=1"), Request::Set("left=1"));
    }

    #[test]
    fn other_requests_are_page() {
        assert_eq!(Request::parse("GET / HTTP/1.1"), Request::Page);
        assert_eq!(Request::parse("GET /set HTTP/1.1"), Request::Page);
        assert_eq!(Request::parse("POST /set?left=1 HTTP/1.1"), Request::Page);
        assert_eq!(Request::parse(""), Request::Page);
    }

    // =========================================================================
    // Query
    // =========================================================================

    #[test]
    fn pairs_skip_bare_keys() {
        let pairs: Vec<_> = query_pairs("a=1&flag&b=x=y").collect();
        assert_eq!(pairs, vec![("a", "1"), ("b", "x=y")]);
    }

    #[test]
    fn update_both_sides() {
        let update = CommandUpdate::parse("left=10&right=-5");
        assert_eq!(update.left, Some(10));
        assert_eq!(update.right, Some(-5));
        assert!(!update.stop);
    }

    #[test]
    fn malformed_value_leaves_side_untouched() {
        let update = CommandUpdate::parse("left=abc&right=40");
        let cmd = update.apply(Command { left: 7, right: 0 });
        assert_eq!(cmd, Command { left: 7, right: 40 });
    }

    #[test]
    fn last_occurrence_wins() {
        assert_eq!(CommandUpdate::parse("left=1&left=2").left, Some(2));
        // The last raw value is malformed, so the side is not updated at all
        assert_eq!(CommandUpdate::parse("left=1&left=x").left, None);
    }

    #[test]
    fn missing_side_keeps_current() {
        let cmd = CommandUpdate::parse("right=30").apply(Command { left: 50, right: 0 });
        assert_eq!(cmd, Command { left: 50, right: 30 });
    }

    #[test]
    fn stop_overrides_speeds() {
        let cmd = CommandUpdate::parse("left=80&right=80&stop=1")
            .apply(Command { left: 10, right: 10 });
        assert_eq!(cmd, Command::STOP);
    }

    #[test]
    fn stop_other_value_ignored() {
        let update = CommandUpdate::parse("stop=0&left=30");
        assert!(!update.stop);
        assert_eq!(update.left, Some(30));
    }

    #[test]
    fn out_of_range_values_pass_through() {
        // Clamping is the motor's job
        assert_eq!(CommandUpdate::parse("left=250").left, Some(250));
    }

    #[test]
    fn overflow_is_malformed() {
        assert_eq!(CommandUpdate::parse("left=99999999999").left, None);
    }
}
