//! Keyword derivation from catalog fields
//!
//! All keywords are normalized the same way as symbol names (lowercase ASCII
//! alphanumerics only), so `delete_widget`, `deleteWidget` and
//! `DeleteWidget` all compare equal.

use endpoint_coverage_common::{normalize_key, EndpointSpec, HttpMethod};

/// Keywords shorter than this match too much to be useful
pub const MIN_KEYWORD_LEN: usize = 3;

/// Generic verbs and filler removed from display names
const GENERIC_WORDS: &[&str] = &[
    "create", "get", "list", "update", "delete", "search", "query", "fetch", "retrieve",
    "describe", "add", "remove", "modify", "set", "put", "patch", "post", "view", "show",
    "a", "an", "the", "of", "for", "by", "to", "api", "info", "information", "details",
];

/// Localized verbs found in catalog display names
const LOCALIZED_VERBS: &[&str] = &[
    "创建", "新建", "新增", "添加", "删除", "移除", "获取", "查询", "查看", "列出", "列表",
    "更新", "修改", "编辑", "设置", "搜索", "详情", "信息",
];

/// Normalized form used for both keywords and symbol names
pub fn normalize(raw: &str) -> String {
    normalize_key(raw)
}

/// Whether a symbol name, once normalized, contains a normalized keyword
pub fn symbol_matches(symbol: &str, keyword: &str) -> bool {
    keyword.len() >= MIN_KEYWORD_LEN && normalize(symbol).contains(keyword)
}

/// Crude English singular form of a normalized word
pub fn singular(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{stem}y");
        }
    }
    for suffix in ["sses", "xes", "ches", "shes", "zes"] {
        if word.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if word.ends_with('s') && !word.ends_with("ss") && word.len() > MIN_KEYWORD_LEN {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

fn is_parameter(segment: &str) -> bool {
    (segment.starts_with('{') && segment.ends_with('}'))
        || (segment.starts_with('<') && segment.ends_with('>'))
        || segment.starts_with(':')
        || segment.starts_with('$')
}

fn is_version(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some('v') | Some('V'))
        && chars.next().map(|c| c.is_ascii_digit()).unwrap_or(false)
}

/// Static path segments after the service and version prefix, normalized
pub fn path_segments(spec: &EndpointSpec) -> Vec<String> {
    let path = spec.path.split(['?', '#']).next().unwrap_or("");
    let service = normalize(&spec.service);
    let version = normalize(&spec.version);

    path.split('/')
        .flat_map(|segment| match segment.strip_prefix(':') {
            Some(_) => vec![segment],
            None => segment.split(':').collect(),
        })
        .filter(|segment| !segment.is_empty() && !is_parameter(segment) && !is_version(segment))
        .map(normalize)
        .filter(|segment| !segment.is_empty() && *segment != service && *segment != version)
        .collect()
}

fn push_unique(keywords: &mut Vec<String>, keyword: String) {
    if keyword.len() >= MIN_KEYWORD_LEN && !keywords.contains(&keyword) {
        keywords.push(keyword);
    }
}

/// Keywords from the final path segment(s), most specific first
pub fn from_path(spec: &EndpointSpec) -> Vec<String> {
    let segments = path_segments(spec);
    let mut keywords = Vec::new();
    let Some(tail) = segments.last() else {
        return keywords;
    };

    if segments.len() >= 2 {
        let parent = singular(&segments[segments.len() - 2]);
        push_unique(&mut keywords, format!("{parent}{}", singular(tail)));
    }
    push_unique(&mut keywords, tail.clone());
    push_unique(&mut keywords, singular(tail));
    keywords
}

/// The display name without generic verbs, as one keyword
pub fn from_name(spec: &EndpointSpec) -> Option<String> {
    let mut text = spec.display_name.clone();
    for verb in LOCALIZED_VERBS {
        text = text.replace(verb, " ");
    }

    let words: Vec<String> = split_words(&text)
        .into_iter()
        .filter(|w| !GENERIC_WORDS.contains(&w.as_str()))
        .collect();

    let keyword = singular(&words.concat());
    (keyword.len() >= MIN_KEYWORD_LEN).then_some(keyword)
}

/// Verbs SDK function names use for each HTTP method, the method itself first
pub fn method_verbs(method: HttpMethod) -> &'static [&'static str] {
    match method {
        HttpMethod::Get => &["get", "list", "fetch", "retrieve", "describe", "query", "read"],
        HttpMethod::Post => &["post", "create", "add", "new", "submit"],
        HttpMethod::Put => &["put", "update", "replace", "set", "modify"],
        HttpMethod::Patch => &["patch", "update", "modify", "edit"],
        HttpMethod::Delete => &["delete", "remove", "destroy"],
    }
}

/// A method verb (or the display name's leading verb) joined to the final
/// path segment, e.g. `getwidget` for `GET /widgets/{id}`
pub fn composite(spec: &EndpointSpec) -> Vec<String> {
    let name_verb = split_words(&spec.display_name)
        .into_iter()
        .next()
        .filter(|w| w.len() >= MIN_KEYWORD_LEN && w.chars().all(|c| c.is_ascii_alphabetic()));
    let segments = path_segments(spec);
    let mut keywords = Vec::new();
    let Some(tail) = segments.last() else {
        return keywords;
    };

    let verbs = method_verbs(spec.http_method)
        .iter()
        .copied()
        .chain(name_verb.as_deref());
    for verb in verbs {
        push_unique(&mut keywords, format!("{verb}{tail}"));
        push_unique(&mut keywords, format!("{verb}{}", singular(tail)));
    }
    keywords
}

/// Resource name used to fill `{resource}` in special-case keywords
pub fn resource(spec: &EndpointSpec) -> Option<String> {
    let declared = normalize(&spec.resource);
    if declared.len() >= MIN_KEYWORD_LEN {
        return Some(singular(&declared));
    }
    let segments = path_segments(spec);
    segments
        .iter()
        .rev()
        .skip(1)
        .chain(segments.last())
        .find(|s| s.len() >= MIN_KEYWORD_LEN)
        .map(|s| singular(s))
}

/// The single best keyword for the broadened fallback: the singular path tail
pub fn best(spec: &EndpointSpec) -> Option<String> {
    from_path(spec)
        .pop()
        .or_else(|| from_name(spec))
        .or_else(|| composite(spec).into_iter().next())
}

/// Split text into lowercase ASCII words at non-alphanumerics and camelCase humps
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in text.chars() {
        if !ch.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_ascii_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
        current.push(ch.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}
