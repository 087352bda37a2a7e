//! Release Tokens
//!
//! A fully-qualified Unity release identifier such as `2022.3.10f1`:
//!
//! ```text
//! token   := major "." minor "." patch channel build
//! major   := digit{1,4}
//! minor   := digit+
//! patch   := digit+
//! channel := "a" | "b" | "c" | "f" | "p" | "x"
//! build   := digit+
//! ```
//!
//! Catalog strings are free-form (`"2022.3.10f1 (LTS) installed"`); only the
//! first embedded token is significant.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

const TOKEN_PATTERN: &str = r"(\d{1,4})\.(\d+)\.(\d+)([abcfpx])(\d+)";

static EMBEDDED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(TOKEN_PATTERN).expect("valid regex"));

static EXACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("^{}$", TOKEN_PATTERN)).expect("valid regex"));

/// Release channel letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Alpha,
    Beta,
    Candidate,
    Final,
    Patch,
    Experimental,
}

impl Channel {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'a' => Some(Channel::Alpha),
            'b' => Some(Channel::Beta),
            'c' => Some(Channel::Candidate),
            'f' => Some(Channel::Final),
            'p' => Some(Channel::Patch),
            'x' => Some(Channel::Experimental),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Channel::Alpha => 'a',
            Channel::Beta => 'b',
            Channel::Candidate => 'c',
            Channel::Final => 'f',
            Channel::Patch => 'p',
            Channel::Experimental => 'x',
        }
    }
}

/// Typed `(major, minor, patch, channel, build)` record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReleaseToken {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub channel: Channel,
    pub build: u32,
}

impl ReleaseToken {
    /// Parse a string that must be exactly one token
    pub fn parse(text: &str) -> Option<Self> {
        EXACT_RE.captures(text).and_then(|caps| Self::from_captures(&caps))
    }

    /// Find the first token embedded in `text`, with the text it was read from
    pub fn find_in(text: &str) -> Option<(Self, &str)> {
        let caps = EMBEDDED_RE.captures(text)?;
        let token = Self::from_captures(&caps)?;
        let matched = caps.get(0)?.as_str();
        Some((token, matched))
    }

    /// Whether `text` is a fully-qualified release identifier
    pub fn is_fully_qualified(text: &str) -> bool {
        Self::parse(text).is_some()
    }

    fn from_captures(caps: &regex::Captures<'_>) -> Option<Self> {
        // Numeric groups can still overflow u32; such entries are treated as noise
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
            channel: Channel::from_char(caps[4].chars().next()?)?,
            build: caps[5].parse().ok()?,
        })
    }

    /// Key used to rank final releases of one major line
    pub fn rank_key(&self) -> (u32, u32, u32) {
        (self.minor, self.patch, self.build)
    }
}

impl fmt::Display for ReleaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}{}{}",
            self.major,
            self.minor,
            self.patch,
            self.channel.as_char(),
            self.build
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        let token = ReleaseToken::parse("2022.3.10f1").unwrap();
        assert_eq!(token.major, 2022);
        assert_eq!(token.minor, 3);
        assert_eq!(token.patch, 10);
        assert_eq!(token.channel, Channel::Final);
        assert_eq!(token.build, 1);
        assert_eq!(token.to_string(), "2022.3.10f1");
    }

    #[test]
    fn test_parse_rejects_partial_and_wildcards() {
        assert!(ReleaseToken::parse("2022.3").is_none());
        assert!(ReleaseToken::parse("2022.x").is_none());
        assert!(ReleaseToken::parse("2022.3.10").is_none());
        assert!(ReleaseToken::parse("2022.3.10q1").is_none());
        assert!(ReleaseToken::parse(" 2022.3.10f1").is_none());
    }

    #[test]
    fn test_find_embedded() {
        let (token, text) = ReleaseToken::find_in("Unity 6000.0.23b2 (beta) installed").unwrap();
        assert_eq!(text, "6000.0.23b2");
        assert_eq!(token.channel, Channel::Beta);

        assert!(ReleaseToken::find_in("no version here").is_none());
    }

    #[test]
    fn test_first_embedded_token_wins() {
        let (_, text) = ReleaseToken::find_in("2021.3.1f1 then 2022.1.1f1").unwrap();
        assert_eq!(text, "2021.3.1f1");
    }

    #[test]
    fn test_channel_letters() {
        for c in ['a', 'b', 'c', 'f', 'p', 'x'] {
            assert_eq!(Channel::from_char(c).unwrap().as_char(), c);
        }
        assert!(Channel::from_char('z').is_none());
    }
}
