pub(crate) fn now_ms() -> i64 {
    js_sys::Date::now().round() as i64
}

/// Random per-tab id used to recognize our own realtime echoes.
pub(crate) fn new_socket_client_id() -> String {
    let mut buf = [0u8; 8];
    if getrandom::getrandom(&mut buf).is_err() {
        // Fall back to the clock; uniqueness across tabs is best-effort anyway.
        buf = (js_sys::Date::now() as u64).to_le_bytes();
    }
    hex_id(&buf)
}

fn hex_id(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// URL a saved page is served at. Each path segment is percent-encoded.
pub(crate) fn canonical_page_url(path: &str) -> String {
    let encoded = path
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}
