use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

pub(crate) const REPORT_NUMBER_PARAM: &str = "reportNumber";

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 10;

/// Encode random bytes as a section id: `n_` + base-36 characters.
pub(crate) fn section_id_from_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len());
    out.push_str("n_");
    for b in bytes {
        out.push(ID_ALPHABET[(*b as usize) % ID_ALPHABET.len()] as char);
    }
    out
}

pub(crate) fn new_section_id() -> String {
    let mut buf = [0u8; ID_LEN];
    if let Err(e) = getrandom::getrandom(&mut buf) {
        // Fall back to the clock; ids only need to be unique within one session.
        log::warn!("getrandom failed, using time-based id: {e}");
        let seed = (js_sys::Date::now() * 1000.0) as u64 ^ (js_sys::Math::random() * 1e9) as u64;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = (seed >> ((i % 8) * 8)) as u8;
        }
    }
    section_id_from_bytes(&buf)
}

/// Look up `key` in a `a=1&b=2` style string. The value is URL-decoded and trimmed.
pub(crate) fn find_param(query: &str, key: &str) -> Option<String> {
    let query = query.trim_start_matches(['?', '#']);
    for pair in query.split('&') {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k != key {
            continue;
        }
        let decoded = urlencoding::decode(&v.replace('+', " "))
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| v.to_string());
        let decoded = decoded.trim().to_string();
        if decoded.is_empty() {
            return None;
        }
        return Some(decoded);
    }
    None
}

/// `reportNumber` from the query string first, then from the fragment.
///
/// The fragment may be a bare parameter list (`#reportNumber=7`) or a hash route
/// with its own query (`#/view?reportNumber=7`).
pub(crate) fn report_number_from(search: &str, hash: &str) -> Option<String> {
    if let Some(v) = find_param(search, REPORT_NUMBER_PARAM) {
        return Some(v);
    }
    let hash = hash.trim_start_matches('#');
    let hash_query = hash.split_once('?').map(|(_, q)| q).unwrap_or(hash);
    find_param(hash_query, REPORT_NUMBER_PARAM)
}

pub(crate) fn report_number_from_location() -> Option<String> {
    let location = web_sys::window()?.location();
    let search = location.search().unwrap_or_default();
    let hash = location.hash().unwrap_or_default();
    report_number_from(&search, &hash)
}

pub(crate) fn export_file_name(report_number: Option<&str>) -> String {
    match report_number {
        Some(n) if !n.trim().is_empty() => format!("report-{}.docx", n.trim()),
        _ => "updated.docx".to_string(),
    }
}

pub(crate) async fn read_file_bytes(file: &web_sys::File) -> Result<Vec<u8>, String> {
    let buf = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Failed to read file: {e:?}"))?;
    Ok(js_sys::Uint8Array::new(&buf).to_vec())
}

/// Offer `bytes` to the user as a file download.
pub(crate) fn download_bytes(bytes: &[u8], file_name: &str, mime: &str) -> Result<(), String> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;

    let parts = js_sys::Array::new();
    parts.push(&js_sys::Uint8Array::from(bytes));
    let props = web_sys::BlobPropertyBag::new();
    props.set_type(mime);
    let blob = web_sys::Blob::new_with_u8_array_sequence_and_options(&parts, &props)
        .map_err(|e| format!("Failed to build download: {e:?}"))?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)
        .map_err(|e| format!("Failed to build download: {e:?}"))?;

    let a: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| format!("Failed to build download: {e:?}"))?
        .unchecked_into();
    a.set_href(&url);
    a.set_download(file_name);
    a.click();

    // Revoke on the next tick so the browser has picked up the download.
    leptos_dom::helpers::set_timeout(
        move || {
            let _ = web_sys::Url::revoke_object_url(&url);
        },
        std::time::Duration::from_millis(0),
    );
    Ok(())
}

/// Blocking browser alert, used for missing selection/clipboard.
pub(crate) fn alert(message: &str) {
    if let Some(w) = web_sys::window() {
        let _ = w.alert_with_message(message);
    }
}
