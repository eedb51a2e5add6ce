//! Decoder for server frames carried in WebSocket text messages.

use crate::stomp::frame::{unescape_header, Command, Frame};
use crate::stomp::FrameError;

/// Decodes every frame contained in one transport message.
///
/// Bare EOLs between frames are heart-beats and are skipped, so a message
/// consisting only of `"\n"` yields an empty vector.
pub fn parse_frames(text: &str) -> Result<Vec<Frame>, FrameError> {
    let mut frames = Vec::new();
    let mut rest = text;
    loop {
        rest = rest.trim_start_matches(&['\n', '\r'][..]);
        if rest.is_empty() {
            break;
        }
        let (frame, remainder) = parse_frame(rest)?;
        frames.push(frame);
        rest = remainder;
    }
    Ok(frames)
}

/// Decodes a single frame at the start of `input`, returning the unread tail.
pub fn parse_frame(input: &str) -> Result<(Frame, &str), FrameError> {
    let (command_line, mut rest) = next_line(input)?;
    let command: Command = command_line.parse()?;
    let escaped = command.escapes_headers();

    let mut headers = Vec::new();
    loop {
        let (line, tail) = next_line(rest)?;
        rest = tail;
        if line.is_empty() {
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::MalformedHeader(line.to_string()))?;
        if escaped {
            headers.push((unescape_header(name)?, unescape_header(value)?));
        } else {
            headers.push((name.to_string(), value.to_string()));
        }
    }

    let content_length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .map(|(_, v)| {
            v.trim()
                .parse::<usize>()
                .map_err(|_| FrameError::InvalidContentLength(v.clone()))
        })
        .transpose()?;

    let (body, tail) = match content_length {
        Some(len) => {
            let body = rest
                .get(..len)
                .ok_or_else(|| FrameError::InvalidContentLength(len.to_string()))?;
            let tail = &rest[len..];
            let tail = tail.strip_prefix('\0').ok_or(FrameError::MissingTerminator)?;
            (body, tail)
        }
        None => {
            let end = rest.find('\0').ok_or(FrameError::MissingTerminator)?;
            (&rest[..end], &rest[end + 1..])
        }
    };

    let frame = Frame {
        command,
        headers,
        body: body.to_string(),
    };
    Ok((frame, tail))
}

/// Splits off one line, accepting both `\n` and `\r\n` endings.
fn next_line(input: &str) -> Result<(&str, &str), FrameError> {
    let idx = input.find('\n').ok_or(FrameError::Incomplete)?;
    let line = input[..idx].strip_suffix('\r').unwrap_or(&input[..idx]);
    Ok((line, &input[idx + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connected_frame() {
        let frames = parse_frames("CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].command, Command::Connected);
        assert_eq!(frames[0].header("version"), Some("1.2"));
        assert_eq!(frames[0].header("heart-beat"), Some("0,0"));
        assert!(frames[0].body.is_empty());
    }

    #[test]
    fn test_parse_message_frame_with_json_body() {
        let wire = "MESSAGE\nsubscription:sub-0\nmessage-id:7\ndestination:/topic/blocks\n\n{\"hash\":\"0xabc\"}\0";
        let frames = parse_frames(wire).unwrap();
        assert_eq!(frames.len(), 1);
        let frame = &frames[0];
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("subscription"), Some("sub-0"));
        assert_eq!(frame.body, "{\"hash\":\"0xabc\"}");
    }

    #[test]
    fn test_parse_heartbeat_only_message() {
        assert!(parse_frames("\n").unwrap().is_empty());
        assert!(parse_frames("\r\n\n").unwrap().is_empty());
        assert!(parse_frames("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_multiple_frames_with_heartbeats_between() {
        let wire = "RECEIPT\nreceipt-id:1\n\n\0\n\nRECEIPT\nreceipt-id:2\n\n\0";
        let frames = parse_frames(wire).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].header("receipt-id"), Some("1"));
        assert_eq!(frames[1].header("receipt-id"), Some("2"));
    }

    #[test]
    fn test_parse_accepts_crlf_line_endings() {
        let frames = parse_frames("MESSAGE\r\nsubscription:sub-1\r\n\r\nbody\0").unwrap();
        assert_eq!(frames[0].header("subscription"), Some("sub-1"));
        assert_eq!(frames[0].body, "body");
    }

    #[test]
    fn test_parse_content_length_allows_nul_in_body() {
        let wire = "MESSAGE\ncontent-length:3\n\na\0b\0";
        let frames = parse_frames(wire).unwrap();
        assert_eq!(frames[0].body, "a\0b");
    }

    #[test]
    fn test_parse_unescapes_message_headers() {
        let frames = parse_frames("MESSAGE\ndestination:/a\\cb\n\n\0").unwrap();
        assert_eq!(frames[0].header("destination"), Some("/a:b"));
    }

    #[test]
    fn test_parse_does_not_unescape_connected_headers() {
        let frames = parse_frames("CONNECTED\nserver:x\\cy\n\n\0").unwrap();
        assert_eq!(frames[0].header("server"), Some("x\\cy"));
    }

    #[test]
    fn test_parse_header_value_may_contain_colon_after_first() {
        // Only the first colon separates name from value on CONNECTED.
        let frames = parse_frames("CONNECTED\nserver:broker:1.0\n\n\0").unwrap();
        assert_eq!(frames[0].header("server"), Some("broker:1.0"));
    }

    #[test]
    fn test_parse_encoded_subscribe_frame() {
        let original = Frame::subscribe("sub-3", "/topic/txs");
        let frames = parse_frames(&original.encode()).unwrap();
        assert_eq!(frames, vec![original]);
    }

    #[test]
    fn test_parse_missing_terminator() {
        assert!(matches!(
            parse_frames("MESSAGE\n\nno terminator"),
            Err(FrameError::MissingTerminator)
        ));
    }

    #[test]
    fn test_parse_content_length_past_end() {
        assert!(matches!(
            parse_frames("MESSAGE\ncontent-length:50\n\nshort\0"),
            Err(FrameError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_parse_content_length_not_a_number() {
        assert!(matches!(
            parse_frames("MESSAGE\ncontent-length:abc\n\n\0"),
            Err(FrameError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn test_parse_malformed_header_line() {
        assert!(matches!(
            parse_frames("MESSAGE\nno-colon-here\n\n\0"),
            Err(FrameError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(matches!(
            parse_frames("HELLO\n\n\0"),
            Err(FrameError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_parse_truncated_headers() {
        assert!(matches!(
            parse_frames("MESSAGE\nsubscription:sub-0"),
            Err(FrameError::Incomplete)
        ));
    }
}
