use once_cell::sync::Lazy;
use regex::Regex;

/// Named references handled by the replacement pass. `&amp;` must run
/// first: collapsing it can uncover a reference from the next escape
/// layer, which the remaining replacements then resolve in the same call.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
];

static NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

/// Decode named and numeric character references.
pub fn decode(text: &str) -> String {
    let mut decoded = text.to_string();

    for (entity, replacement) in NAMED_ENTITIES {
        if decoded.contains(entity) {
            decoded = decoded.replace(entity, replacement);
        }
    }

    if decoded.contains("&#") {
        decoded = NUMERIC_ENTITY
            .replace_all(&decoded, |caps: &regex::Captures<'_>| {
                let body = &caps[1];
                let parsed = match body.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16),
                    None => body.parse::<u32>(),
                };
                match parsed.ok().and_then(char::from_u32) {
                    Some(c) => c.to_string(),
                    // Out-of-range or surrogate codepoint; keep the reference as-is.
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
    }

    decoded
}

/// Caption payloads arrive escaped twice: the entities themselves are
/// entity-escaped. One decode per layer.
pub fn decode_twice(text: &str) -> String {
    decode(&decode(text))
}
