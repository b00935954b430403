mod api;
mod app;
mod components;
mod editor;
mod logging;
mod models;
mod outline;
mod pages;
mod state;
mod tree;
mod util;

use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

pub use app::App;


// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    logging::init();
    log::info!("outline editor starting");
    mount_to_body(App);
}

#[cfg(test)]
mod tests {
    use super::api::{ApiClient, ApiErrorKind, ExportRequest, ReportRequest};
    use super::models::{DropPosition, Section, TreeResponse};
    use super::outline::row_class;
    use super::util::{export_file_name, find_param, report_number_from, section_id_from_bytes};
    use base64::Engine;

    #[test]
    fn test_section_contract_deserialize() {
        let json = r#"{
            "id": "s1",
            "title": "Introduction",
            "level": 1,
            "contentHtml": "<p>Hello</p>",
            "children": [
                {"id": "s1.1", "title": "Scope", "level": 2, "contentHtml": "", "children": []}
            ]
        }"#;
        let parsed: Section = serde_json::from_str(json).expect("section should parse");
        assert_eq!(parsed.content_html, "<p>Hello</p>");
        assert_eq!(parsed.children.len(), 1);
        assert_eq!(parsed.children[0].level, 2);
    }

    #[test]
    fn test_section_tolerates_missing_optional_fields() {
        let json = r#"{"id": "s1", "title": "Bare"}"#;
        let parsed: Section = serde_json::from_str(json).expect("sparse section should parse");
        assert_eq!(parsed.level, 1);
        assert!(parsed.content_html.is_empty());
        assert!(parsed.children.is_empty());
    }

    #[test]
    fn test_section_serializes_camel_case_content() {
        let s = Section::new("n_1".to_string(), "New Section", 1);
        let v = serde_json::to_value(&s).expect("should serialize");
        assert_eq!(v["contentHtml"], "<p></p>");
        assert!(v.get("content_html").is_none());
        assert_eq!(v["children"], serde_json::json!([]));
    }

    #[test]
    fn test_tree_response_contract_deserialize() {
        let json = r#"{"tree": [{"id": "a", "title": "A", "level": 1, "contentHtml": "", "children": []}]}"#;
        let parsed: TreeResponse = serde_json::from_str(json).expect("tree response should parse");
        assert_eq!(parsed.tree.len(), 1);
    }

    #[test]
    fn test_parse_tree_response_accepts_wrapped_and_bare() {
        let wrapped = serde_json::json!({"tree": [{"id": "a", "title": "A"}]});
        let bare = serde_json::json!([{"id": "b", "title": "B"}]);

        let a = ApiClient::parse_tree_response(wrapped).expect("wrapped tree");
        let b = ApiClient::parse_tree_response(bare).expect("bare tree");
        assert_eq!(a[0].id, "a");
        assert_eq!(b[0].id, "b");
    }

    #[test]
    fn test_parse_tree_response_rejects_unexpected_shape() {
        let err = ApiClient::parse_tree_response(serde_json::json!({"message": "ok"}))
            .expect_err("missing tree should fail");
        assert_eq!(err.kind, ApiErrorKind::Parse);

        let err = ApiClient::parse_tree_response(serde_json::json!({"tree": "nope"}))
            .expect_err("non-array tree should fail");
        assert_eq!(err.kind, ApiErrorKind::Parse);
    }

    #[test]
    fn test_export_request_is_base64_json() {
        let tree = vec![Section::new("n_1".to_string(), "Intro", 1)];
        let req = ExportRequest::encode(&tree).expect("should encode");

        let raw = base64::engine::general_purpose::STANDARD
            .decode(&req.data)
            .expect("data should be base64");
        let back: Vec<Section> = serde_json::from_slice(&raw).expect("payload should be sections");
        assert_eq!(back, tree);

        let v = serde_json::to_value(&req).expect("should serialize");
        assert!(v["data"].is_string());
    }

    #[test]
    fn test_report_request_serialization() {
        let v = serde_json::to_value(ReportRequest {
            report_number: "1042".to_string(),
        })
        .expect("should serialize");
        assert_eq!(v, serde_json::json!({"reportNumber": "1042"}));
    }

    #[test]
    fn test_api_client_trims_trailing_slash() {
        let client = ApiClient::new("http://svc.local/".to_string());
        assert_eq!(client.base_url, "http://svc.local");
    }

    #[test]
    fn test_report_number_from_query() {
        assert_eq!(
            report_number_from("?reportNumber=1042&x=1", ""),
            Some("1042".to_string())
        );
        assert_eq!(report_number_from("?x=1", ""), None);
        assert_eq!(report_number_from("?reportNumber=", ""), None);
    }

    #[test]
    fn test_report_number_from_fragment() {
        assert_eq!(report_number_from("", "#reportNumber=77"), Some("77".to_string()));
        assert_eq!(
            report_number_from("", "#/view?reportNumber=%2078%20"),
            Some("78".to_string())
        );
        // Query wins over fragment.
        assert_eq!(
            report_number_from("?reportNumber=1", "#reportNumber=2"),
            Some("1".to_string())
        );
    }

    #[test]
    fn test_find_param_exact_key_match() {
        assert_eq!(find_param("reportNumberX=1&reportNumber=2", "reportNumber"), Some("2".to_string()));
        assert_eq!(find_param("", "reportNumber"), None);
    }

    #[test]
    fn test_section_id_format() {
        let id = section_id_from_bytes(&[0, 35, 36, 255]);
        assert_eq!(id, "n_0z03");
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(None), "updated.docx");
        assert_eq!(export_file_name(Some("1042")), "report-1042.docx");
        assert_eq!(export_file_name(Some("  ")), "updated.docx");
    }

    #[test]
    fn test_row_class_reflects_drop_hint() {
        assert!(row_class(true, false, None).contains("bg-accent"));
        assert!(row_class(false, true, None).contains("opacity-50"));
        assert!(row_class(false, false, Some(DropPosition::Before)).contains("border-t-primary"));
        assert!(row_class(false, false, Some(DropPosition::Inside)).contains("ring-primary"));
    }

    #[test]
    fn test_jodit_options() {
        let v = super::editor::jodit_options();
        assert_eq!(v["readonly"], false);
        assert_eq!(v["uploader"]["insertImageAsBase64URI"], true);
    }
}
