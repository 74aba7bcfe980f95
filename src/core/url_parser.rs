#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub video_id: String,
    pub page: Option<u32>,
}

/// Accepts a bare identifier (`BV1xx411c7mD`) or a `bilibili.com/video/<id>` URL.
pub fn parse_input(input: &str) -> Option<ParsedInput> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = url::Url::parse(input) {
        return parse_video_url(&parsed);
    }

    if input.contains(['/', '?', '&', '#']) || input.chars().any(char::is_whitespace) {
        return None;
    }

    Some(ParsedInput {
        video_id: input.to_string(),
        page: None,
    })
}

fn parse_video_url(parsed: &url::Url) -> Option<ParsedInput> {
    let host = parsed.host_str()?.to_lowercase();
    if host != "bilibili.com" && !host.ends_with(".bilibili.com") {
        return None;
    }

    let segments: Vec<&str> = parsed.path().split('/').filter(|s| !s.is_empty()).collect();
    let pos = segments.iter().position(|s| *s == "video")?;
    let video_id = segments.get(pos + 1)?.to_string();

    let page = parsed
        .query_pairs()
        .find(|(k, _)| k == "p")
        .and_then(|(_, v)| v.parse::<u32>().ok());

    Some(ParsedInput { video_id, page })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_identifier() {
        let parsed = parse_input("  BV1JmWSetECH\n").unwrap();
        assert_eq!(parsed.video_id, "BV1JmWSetECH");
        assert_eq!(parsed.page, None);
    }

    #[test]
    fn video_url_with_tracking_query() {
        let parsed = parse_input(
            "https://www.bilibili.com/video/BV1wg4y127mJ/?spm_id_from=333.337.search-card.all.click",
        )
        .unwrap();
        assert_eq!(parsed.video_id, "BV1wg4y127mJ");
    }

    #[test]
    fn mobile_url_with_page() {
        let parsed = parse_input("https://m.bilibili.com/video/BV1JmWSetECH?p=3").unwrap();
        assert_eq!(parsed.video_id, "BV1JmWSetECH");
        assert_eq!(parsed.page, Some(3));
    }

    #[test]
    fn foreign_host_rejected() {
        assert_eq!(parse_input("https://www.youtube.com/watch?v=abc"), None);
    }

    #[test]
    fn garbage_rejected() {
        assert_eq!(parse_input(""), None);
        assert_eq!(parse_input("two words"), None);
        assert_eq!(parse_input("video/BV1"), None);
    }
}
