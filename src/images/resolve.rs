use super::ImageKind;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use tracing::warn;

/// Display reference handed out when no usable image URL exists. Callers
/// always receive either this or a proxy reference, never an empty string.
pub const PLACEHOLDER: &str = "/placeholder.svg?height=320&width=320";

/// Route prefix of already-resolved references; resolving one is a no-op.
const PROXY_PREFIX: &str = "/image-proxy";

/// Resolve a raw image source string to the primary display reference: the
/// first usable candidate wrapped as a proxy reference, or the placeholder.
pub fn resolve_primary(source: &str, kind: ImageKind) -> String {
    resolve_gallery(source, kind)
        .into_iter()
        .next()
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Resolve every candidate in the source string, preserving order. Sources
/// may hold a single URL, a comma list, or a bracketed list `[a, b]`.
pub fn resolve_gallery(source: &str, kind: ImageKind) -> Vec<String> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return vec![PLACEHOLDER.to_string()];
    }
    if trimmed.starts_with(PROXY_PREFIX) {
        return vec![trimmed.to_string()];
    }

    let inner = if trimmed.starts_with('[') && trimmed.ends_with(']') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };

    let candidates: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .collect();

    if candidates.is_empty() {
        return vec![PLACEHOLDER.to_string()];
    }

    candidates
        .into_iter()
        .map(|candidate| proxy_reference(candidate, kind))
        .collect()
}

/// Wrap one absolute URL as an opaque proxy reference. Unusable inputs
/// (too short, not http, Imgur album links that have no direct asset form)
/// degrade to the placeholder rather than erroring.
pub fn proxy_reference(url: &str, kind: ImageKind) -> String {
    let url = url.trim();
    if url.starts_with(PROXY_PREFIX) {
        return url.to_string();
    }
    if url.len() < 10 || !url.contains("http") {
        return PLACEHOLDER.to_string();
    }
    if url.contains("imgur.com/a/") {
        warn!(
            target = "zahara.images",
            "album link needs manual conversion to a direct asset URL"
        );
        return PLACEHOLDER.to_string();
    }

    let direct = rewrite_drive_view_link(url).unwrap_or_else(|| url.to_string());
    let token = BASE64.encode(direct.as_bytes());
    format!(
        "{PROXY_PREFIX}?url={}&type={}",
        urlencoding::encode(&token),
        kind.as_query()
    )
}

/// Drive "file view" share links are not directly fetchable; rewrite them to
/// the direct-content form carrying the same file id.
fn rewrite_drive_view_link(url: &str) -> Option<String> {
    let rest = url.split("drive.google.com/file/d/").nth(1)?;
    let file_id: String = rest
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-'))
        .collect();
    if file_id.is_empty() {
        return None;
    }
    Some(format!(
        "https://drive.google.com/uc?export=view&id={file_id}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::proxy::decode_token;

    fn decoded(reference: &str) -> String {
        let token = reference
            .strip_prefix("/image-proxy?url=")
            .and_then(|rest| rest.split('&').next())
            .expect("proxy reference shape");
        let token = urlencoding::decode(token).unwrap();
        decode_token(&token).unwrap().to_string()
    }

    #[test]
    fn empty_source_yields_placeholder() {
        assert_eq!(resolve_primary("", ImageKind::Fragrance), PLACEHOLDER);
        assert_eq!(resolve_primary("   ", ImageKind::Fragrance), PLACEHOLDER);
    }

    #[test]
    fn resolving_a_resolved_reference_is_a_no_op() {
        let reference = resolve_primary("https://i.imgur.com/abc123.jpg", ImageKind::Fragrance);
        assert_eq!(resolve_primary(&reference, ImageKind::Fragrance), reference);
        assert_eq!(
            resolve_gallery(&reference, ImageKind::Fragrance),
            vec![reference]
        );
    }

    #[test]
    fn bracketed_list_uses_first_candidate() {
        let reference = resolve_primary(
            "[http://a.com/1.jpg, http://a.com/2.jpg]",
            ImageKind::Fragrance,
        );
        assert_eq!(decoded(&reference), "http://a.com/1.jpg");
    }

    #[test]
    fn gallery_preserves_every_candidate_in_order() {
        let gallery = resolve_gallery(
            "http://a.com/1.jpg, http://a.com/2.jpg,, http://a.com/3.jpg",
            ImageKind::Fragrance,
        );
        assert_eq!(gallery.len(), 3);
        assert_eq!(decoded(&gallery[0]), "http://a.com/1.jpg");
        assert_eq!(decoded(&gallery[2]), "http://a.com/3.jpg");
    }

    #[test]
    fn drive_view_link_is_rewritten_to_direct_content() {
        let reference = resolve_primary(
            "https://drive.google.com/file/d/1AbC_x-9/view?usp=sharing",
            ImageKind::Fragrance,
        );
        assert_eq!(
            decoded(&reference),
            "https://drive.google.com/uc?export=view&id=1AbC_x-9"
        );
    }

    #[test]
    fn imgur_album_link_degrades_to_placeholder() {
        assert_eq!(
            resolve_primary("https://imgur.com/a/xyz987", ImageKind::Decant),
            PLACEHOLDER
        );
        let gallery = resolve_gallery(
            "https://imgur.com/a/xyz987, https://i.imgur.com/ok.jpg",
            ImageKind::Decant,
        );
        assert_eq!(gallery[0], PLACEHOLDER);
        assert_eq!(decoded(&gallery[1]), "https://i.imgur.com/ok.jpg");
    }

    #[test]
    fn short_or_non_http_input_degrades_to_placeholder() {
        assert_eq!(resolve_primary("n/a", ImageKind::Fragrance), PLACEHOLDER);
        assert_eq!(
            resolve_primary("ftp://example.com/image.jpg", ImageKind::Fragrance),
            PLACEHOLDER
        );
    }

    #[test]
    fn reference_carries_the_type_tag() {
        let reference = resolve_primary("https://i.imgur.com/abc.jpg", ImageKind::Decant);
        assert!(reference.ends_with("&type=decant"));
    }

    #[test]
    fn token_round_trips_to_the_origin_url() {
        let origin = "https://lh3.googleusercontent.com/d/abc?sz=w640";
        let reference = resolve_primary(origin, ImageKind::Fragrance);
        assert_eq!(decoded(&reference), origin);
    }
}
