mod helpers;
use helpers::setup_engine;

use bsm_relay::server::protocol::{Response, EMPTY_PULL};
use bsm_relay::server::routing::route;

fn text(resp: &Response) -> String {
    String::from_utf8(resp.as_bytes().to_vec()).unwrap()
}

mod features {
    use super::*;

    #[test]
    fn test_push_pull_check_round() {
        let engine = setup_engine();

        let ack = route(r#"{"mode":"push","msg":"{\"id\":1}"}"#, &engine);
        assert_eq!(text(&ack), "Ok.");

        let pulled = route(r#"{"mode":"pull"}"#, &engine);
        assert_eq!(text(&pulled), r#"{"id":1}"#);

        let empty = route(r#"{"mode":"pull"}"#, &engine);
        assert_eq!(text(&empty), EMPTY_PULL);

        let check = route(r#"{"mode":"check"}"#, &engine);
        assert_eq!(text(&check), r#"{"msgs":["{\"id\":1}"]}"#);
    }

    #[test]
    fn test_batch_push_reports_failures() {
        let engine = setup_engine();
        let resp = route(
            r#"{"mode":"push","msg":"[{\"id\":1},{\"speed\":3},{\"id\":2}]"}"#,
            &engine,
        );
        assert_eq!(text(&resp), "ERROR: Failed to push 1 / 3 objects.");
        assert_eq!(engine.store.len(), 2, "Valid items stay applied");
    }

    #[test]
    fn test_inline_msg_is_accepted() {
        let engine = setup_engine();
        let resp = route(r#"{"mode":"push","msg":[{"id":"a"},{"id":"b"}]}"#, &engine);
        assert_eq!(text(&resp), "Ok.");
        assert_eq!(engine.store.len(), 2);
    }

    #[test]
    fn test_unparsable_msg_counts_as_one_failure() {
        let engine = setup_engine();
        let resp = route(r#"{"mode":"push","msg":"{broken"}"#, &engine);
        assert_eq!(text(&resp), "ERROR: Failed to push 1 / 1 objects.");
    }

    #[test]
    fn test_check_filters_by_last_updated() {
        let engine = setup_engine();
        let old = bsm_relay::utils::utils_time::now_secs() - 10.0;
        let push = format!(
            r#"{{"mode":"push","msg":[{{"id":1,"secMark":{}}},{{"id":2}}]}}"#,
            old
        );
        assert_eq!(text(&route(&push, &engine)), "Ok.");

        let recent = route(r#"{"mode":"check","last_updated":5}"#, &engine);
        assert_eq!(text(&recent), r#"{"msgs":["{\"id\":2}"]}"#);

        let all = route(r#"{"mode":"check"}"#, &engine);
        let parsed: serde_json::Value = serde_json::from_slice(all.as_bytes()).unwrap();
        assert_eq!(parsed["msgs"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_check_with_sort_orders_by_last_read() {
        let engine = setup_engine();
        route(r#"{"mode":"push","msg":[{"id":1},{"id":2}]}"#, &engine);
        assert_eq!(text(&route(r#"{"mode":"pull"}"#, &engine)), r#"{"id":1}"#);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(text(&route(r#"{"mode":"pull"}"#, &engine)), r#"{"id":2}"#);
        // Inactive id 1 is rotated behind id 2
        assert_eq!(text(&route(r#"{"mode":"pull"}"#, &engine)), EMPTY_PULL);

        let unsorted = route(r#"{"mode":"check"}"#, &engine);
        assert_eq!(text(&unsorted), r#"{"msgs":["{\"id\":2}","{\"id\":1}"]}"#);

        let sorted = route(r#"{"mode":"check","sort":true}"#, &engine);
        assert_eq!(text(&sorted), r#"{"msgs":["{\"id\":1}","{\"id\":2}"]}"#);
    }

    #[test]
    fn test_check_does_not_consume() {
        let engine = setup_engine();
        route(r#"{"mode":"push","msg":"{\"id\":1}"}"#, &engine);
        let a = route(r#"{"mode":"check"}"#, &engine);
        let b = route(r#"{"mode":"check"}"#, &engine);
        assert_eq!(a, b);
        assert_eq!(text(&route(r#"{"mode":"pull"}"#, &engine)), r#"{"id":1}"#);
    }
}

mod protocol_errors {
    use super::*;

    #[test]
    fn test_missing_mode() {
        let engine = setup_engine();
        assert_eq!(
            text(&route(r#"{"msg":"{}"}"#, &engine)),
            r#"ERROR: No "mode" in request."#
        );
    }

    #[test]
    fn test_unknown_mode() {
        let engine = setup_engine();
        assert_eq!(
            text(&route(r#"{"mode":"subscribe"}"#, &engine)),
            r#"ERROR: Value for "mode" unknown."#
        );
    }

    #[test]
    fn test_non_string_mode_is_unknown() {
        let engine = setup_engine();
        for line in [r#"{"mode":1}"#, r#"{"mode":["push"]}"#, r#"{"mode":null}"#] {
            assert_eq!(text(&route(line, &engine)), r#"ERROR: Value for "mode" unknown."#);
        }
    }

    #[test]
    fn test_non_object_envelopes_never_reach_the_store() {
        let engine = setup_engine();
        route(r#"{"mode":"push","msg":"{\"id\":7}"}"#, &engine);

        for line in [r#"["push","{\"id\":1}",null]"#, r#"["pull",null,null]"#, "3", r#""pull""#] {
            assert_eq!(text(&route(line, &engine)), "ERROR: Malformed request.", "{line}");
        }

        assert_eq!(engine.store.len(), 1, "Array push must not insert");
        // Record 7 still has its freshness: the array pull did not consume it
        assert_eq!(text(&route(r#"{"mode":"pull"}"#, &engine)), r#"{"id":7}"#);
    }

    #[test]
    fn test_wrongly_typed_fields_are_malformed() {
        let engine = setup_engine();
        assert_eq!(
            text(&route(r#"{"mode":"check","last_updated":"soon"}"#, &engine)),
            "ERROR: Malformed request."
        );
        assert_eq!(
            text(&route(r#"{"mode":"pull","sort":"yes"}"#, &engine)),
            "ERROR: Malformed request."
        );
    }

    #[test]
    fn test_malformed_envelope() {
        let engine = setup_engine();
        let resp = text(&route("not json at all", &engine));
        assert_eq!(resp, "ERROR: Malformed request.");
    }

    #[test]
    fn test_push_without_msg() {
        let engine = setup_engine();
        assert_eq!(
            text(&route(r#"{"mode":"push"}"#, &engine)),
            r#"ERROR: No "msg" in request."#
        );
    }
}
