use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};
use tracing::debug;
use url::Url;

/// Points awarded when nothing in the payload looks like a points value.
pub const DEFAULT_POINTS: u64 = 10;

const REWARD_KEYWORDS: [&str; 3] = ["point", "reward", "credit"];
const STRUCTURED_FIELDS: [&str; 2] = ["points", "amount"];
const URL_PARAMS: [&str; 3] = ["points", "amount", "value"];

/// `source` tag carried by generated sample payloads.
pub const SAMPLE_SOURCE: &str = "segro-reward";

lazy_static! {
    // ASCII only: `\d` would also match other scripts' digits
    static ref DIGITS_RE: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref NUMBER_RE: Regex = Regex::new(r"[0-9]+(?:\.[0-9]+)?").unwrap();
}

/// Maps a decoded QR payload to the number of points it is worth.
///
/// Rules are tried in a fixed order and the first one that yields a value wins:
/// a JSON object with a numeric `points` (then `amount`) field, a digit run in
/// text mentioning points/rewards/credit, the first number anywhere in the text,
/// a `points`/`amount`/`value` query parameter of a URL, and finally
/// [`DEFAULT_POINTS`].
pub fn extract_points(raw: &str) -> u64 {
    debug!(payload = %raw, "interpreting qr payload");

    if let Some(points) = structured_points(raw) {
        debug!(points, "points from structured payload");
        return points;
    }
    if let Some(points) = keyword_points(raw) {
        debug!(points, "points from reward text");
        return points;
    }
    if let Some(points) = first_number(raw) {
        debug!(points, "points from bare number");
        return points;
    }
    if let Some(points) = url_param_points(raw) {
        debug!(points, "points from url query");
        return points;
    }

    debug!("no points found, using default");
    DEFAULT_POINTS
}

/// Builds the JSON payload a reward QR code carries, for printing test codes.
/// `extract_points` reads the value back through the structured rule.
pub fn sample_payload(points: u64, now: OffsetDateTime) -> String {
    let now = now.to_offset(UtcOffset::UTC);
    let timestamp = now.format(&Rfc3339).unwrap_or_else(|_| now.to_string());
    json!({
        "points": points,
        "timestamp": timestamp,
        "source": SAMPLE_SOURCE,
    })
    .to_string()
}

fn structured_points(raw: &str) -> Option<u64> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let obj = value.as_object()?;
    STRUCTURED_FIELDS
        .iter()
        .find_map(|field| obj.get(*field).and_then(Value::as_f64))
        .map(clamp_floor)
}

fn keyword_points(raw: &str) -> Option<u64> {
    let lower = raw.to_lowercase();
    if !REWARD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return None;
    }
    let digits = DIGITS_RE.find(raw)?;
    Some(parse_digits(digits.as_str()))
}

fn first_number(raw: &str) -> Option<u64> {
    let m = NUMBER_RE.find(raw)?;
    let value: f64 = m.as_str().parse().ok()?;
    Some(clamp_floor(value))
}

fn url_param_points(raw: &str) -> Option<u64> {
    let url = Url::parse(raw).ok()?;
    let param = URL_PARAMS.iter().find_map(|name| {
        url.query_pairs()
            .find(|(k, v)| k == *name && !v.is_empty())
            .map(|(_, v)| v.into_owned())
    })?;
    let value = leading_int(&param)?;
    Some(value.clamp(0, u64::MAX as i128) as u64)
}

/// Integer prefix of `s`, ignoring leading whitespace. Accepts fullwidth
/// digits too, which is the only way a query value can carry a number when
/// the raw text holds no ASCII digit.
fn leading_int(s: &str) -> Option<i128> {
    let s = s.trim_start();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut digits = rest.chars().map_while(decimal_digit).peekable();
    digits.peek()?;
    let magnitude = digits.fold(0i128, |acc, d| {
        acc.saturating_mul(10).saturating_add(i128::from(d))
    });
    Some(if negative { -magnitude } else { magnitude })
}

fn decimal_digit(c: char) -> Option<u32> {
    match c {
        '0'..='9' => c.to_digit(10),
        '\u{FF10}'..='\u{FF19}' => Some(c as u32 - 0xFF10),
        _ => None,
    }
}

/// Digit runs can exceed `u64`; saturate rather than fail.
fn parse_digits(digits: &str) -> u64 {
    digits.parse().unwrap_or(u64::MAX)
}

fn clamp_floor(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        // `as` saturates for values beyond u64::MAX
        value.floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_points_field() {
        assert_eq!(extract_points(r#"{"points":50}"#), 50);
        assert_eq!(
            extract_points(r#"{"points":250,"timestamp":"2024-01-01T00:00:00Z","source":"segro-reward"}"#),
            250
        );
    }

    #[test]
    fn structured_amount_field_when_points_missing() {
        assert_eq!(extract_points(r#"{"amount":30}"#), 30);
        assert_eq!(extract_points(r#"{"points":"x","amount":30}"#), 30);
    }

    #[test]
    fn structured_points_beats_amount() {
        assert_eq!(extract_points(r#"{"amount":30,"points":7}"#), 7);
    }

    #[test]
    fn structured_negative_is_clamped() {
        assert_eq!(extract_points(r#"{"points":-40}"#), 0);
        assert_eq!(extract_points(r#"{"amount":-1}"#), 0);
    }

    #[test]
    fn structured_fraction_is_floored() {
        assert_eq!(extract_points(r#"{"points":12.9}"#), 12);
    }

    #[test]
    fn structured_without_numeric_field_falls_through_to_text_rules() {
        // no keyword, first number in text wins
        assert_eq!(extract_points(r#"{"id":"abc","qty":3}"#), 3);
        // json scalar is not a structured payload
        assert_eq!(extract_points("42"), 42);
        // keyword present in the raw json text
        assert_eq!(extract_points(r#"{"points":"15 pts"}"#), 15);
    }

    #[test]
    fn keyword_text_takes_first_digit_run() {
        assert_eq!(extract_points("reward: 75 bonus"), 75);
        assert_eq!(extract_points("You earned 20 POINTS"), 20);
        assert_eq!(extract_points("store credit 12.75"), 12);
    }

    #[test]
    fn keyword_text_ignores_sign() {
        assert_eq!(extract_points("points: -30"), 30);
    }

    #[test]
    fn bare_number_is_floored() {
        assert_eq!(extract_points("bottle 3.99"), 3);
        assert_eq!(extract_points("abc 125 def 7"), 125);
    }

    #[test]
    fn url_with_digits_is_resolved_by_text_rule() {
        assert_eq!(extract_points("https://example.com/item/777?points=5"), 777);
    }

    #[test]
    fn url_without_ascii_digits_uses_query_param() {
        assert_eq!(extract_points("https://example.com/scan?points=４０"), 40);
        assert_eq!(extract_points("https://example.com/scan?amount=９"), 9);
        assert_eq!(extract_points("https://example.com/scan?value=１５&x=y"), 15);
    }

    #[test]
    fn url_query_param_precedence() {
        assert_eq!(
            extract_points("https://example.com/?value=１&amount=２&points=３"),
            3
        );
        assert_eq!(extract_points("https://example.com/?value=１&amount=２"), 2);
    }

    #[test]
    fn url_param_takes_integer_prefix() {
        assert_eq!(extract_points("https://example.com/?amount=７abc"), 7);
    }

    #[test]
    fn percent_encoded_digits_are_still_bare_digits() {
        assert_eq!(extract_points("https://example.com/?points=%34%30"), 34);
    }

    #[test]
    fn url_param_without_integer_falls_back() {
        assert_eq!(extract_points("https://example.com/?points=abc"), DEFAULT_POINTS);
        assert_eq!(extract_points("https://example.com/?points="), DEFAULT_POINTS);
    }

    #[test]
    fn url_param_negative_is_clamped() {
        assert_eq!(extract_points("https://example.com/?points=-５"), 0);
    }

    #[test]
    fn fallback_default() {
        assert_eq!(extract_points("hello world"), 10);
        assert_eq!(extract_points(""), 10);
        assert_eq!(extract_points("https://example.com/no-params"), 10);
    }

    #[test]
    fn sample_payload_reads_back_its_points() {
        let now = time::macros::datetime!(2024-05-01 12:00 UTC);
        for points in [0, 1, 10, 250, 1000] {
            assert_eq!(extract_points(&sample_payload(points, now)), points);
        }
    }

    #[test]
    fn sample_payload_fields() {
        let now = time::macros::datetime!(2024-05-01 14:30 +2);
        let value: Value = serde_json::from_str(&sample_payload(75, now)).unwrap();
        assert_eq!(value["points"], 75);
        assert_eq!(value["timestamp"], "2024-05-01T12:30:00Z");
        assert_eq!(value["source"], SAMPLE_SOURCE);
    }

    #[test]
    fn oversized_digit_run_saturates() {
        assert_eq!(extract_points("points 99999999999999999999999"), u64::MAX);
    }
}
