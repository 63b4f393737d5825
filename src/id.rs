use ulid::Ulid;

const MAX_EXTENSION_LEN: usize = 8;

pub fn new_ulid_string() -> String {
    Ulid::new().to_string()
}

pub fn is_ulid_string(s: &str) -> bool {
    Ulid::from_string(s).is_ok()
}

/// Object name for a freshly uploaded image: a new ULID, plus the uploaded
/// file's extension when it is short and plain alphanumeric.
pub fn new_image_name(uploaded_filename: Option<&str>) -> String {
    let token = new_ulid_string();
    match uploaded_filename.and_then(image_extension) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    }
}

/// True for names `new_image_name` can produce: a ULID, optionally followed
/// by a lower-case alphanumeric extension.
pub fn is_image_name(name: &str) -> bool {
    let (token, ext) = match name.split_once('.') {
        Some((token, ext)) => (token, Some(ext)),
        None => (name, None),
    };
    let ext_ok = ext.is_none_or(|ext| {
        !ext.is_empty()
            && ext.len() <= MAX_EXTENSION_LEN
            && ext
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    });
    ext_ok && is_ulid_string(token)
}

fn image_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
