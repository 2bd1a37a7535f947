/// Known leading bytes per MIME type. A declared type may accept more
/// than one signature (TIFF byte orders).
const SIGNATURES: &[(&str, &[&[u8]])] = &[
    ("image/jpeg", &[&[0xFF, 0xD8, 0xFF]]),
    ("image/png", &[&[0x89, 0x50, 0x4E, 0x47]]),
    ("image/gif", &[&[0x47, 0x49, 0x46]]),
    // RIFF container header
    ("image/webp", &[&[0x52, 0x49, 0x46, 0x46]]),
    ("image/bmp", &[&[0x42, 0x4D]]),
    (
        "image/tiff",
        &[&[0x49, 0x49, 0x2A, 0x00], &[0x4D, 0x4D, 0x00, 0x2A]],
    ),
];

/// Lowercase the essence of a content type and drop any parameters,
/// folding legacy JPEG aliases onto `image/jpeg`.
pub fn normalize_content_type(content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        _ => essence,
    }
}

pub fn is_image_content_type(content_type: &str) -> bool {
    normalize_content_type(content_type).starts_with("image/")
}

/// Signatures registered for a declared type, or `None` when the type
/// is not in the table.
pub fn expected_signatures(declared_content_type: &str) -> Option<&'static [&'static [u8]]> {
    let declared = normalize_content_type(declared_content_type);
    SIGNATURES
        .iter()
        .find(|(mime, _)| *mime == declared)
        .map(|(_, signatures)| *signatures)
}

/// Check the leading bytes against the declared type. Types without a
/// registered signature pass unchecked.
pub fn matches_signature(bytes: &[u8], declared_content_type: &str) -> bool {
    match expected_signatures(declared_content_type) {
        Some(signatures) => signatures.iter().any(|sig| bytes.starts_with(sig)),
        None => true,
    }
}
