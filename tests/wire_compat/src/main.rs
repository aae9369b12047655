fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use lfs_relay_protocol::{
        CommandKind, DecodeError, InitResponse, Operation, Request, Response, decode_request,
        encode_line,
    };

    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn load_fixture(name: &str) -> serde_json::Value {
        let path = fixtures_dir().join(name);
        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()));
        serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("failed to parse fixture {}: {e}", path.display()))
    }

    /// The fixture compacted onto one line, as the controller would send it.
    fn fixture_line(name: &str) -> String {
        load_fixture(name).to_string()
    }

    /// Deserializes a fixture, re-serializes it and compares the JSON values.
    fn roundtrip_test<T>(name: &str) -> T
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  wire: {fixture}\n  Rust: {reserialized}"
        );
        parsed
    }

    // --- Requests ---

    #[test]
    fn fixture_init_request() {
        let Request::Init(init) = roundtrip_test::<Request>("init_request.json") else {
            panic!("expected init");
        };
        assert_eq!(init.operation, Some(Operation::Download));
        assert_eq!(init.remote.as_deref(), Some("origin"));
        assert!(init.concurrent);
        assert_eq!(init.concurrent_transfers, 3);
    }

    #[test]
    fn fixture_download_request() {
        let Request::Download(req) = roundtrip_test::<Request>("download_request.json") else {
            panic!("expected download");
        };
        assert_eq!(req.size, 21245);
        assert_eq!(req.action.header["Authorization"], "Basic dXNlcjpwYXNz");
        assert!(req.action.expires_at.is_some());
    }

    #[test]
    fn fixture_upload_request() {
        let Request::Upload(req) = roundtrip_test::<Request>("upload_request.json") else {
            panic!("expected upload");
        };
        assert_eq!(req.path, PathBuf::from("/path/to/file.png"));
        assert_eq!(req.action.header["Transfer-Encoding"], "chunked");
    }

    #[test]
    fn fixture_terminate_request() {
        assert_eq!(
            roundtrip_test::<Request>("terminate_request.json"),
            Request::Terminate
        );
    }

    #[test]
    fn request_fixtures_decode_as_lines() {
        for (name, kind) in [
            ("init_request.json", CommandKind::Init),
            ("download_request.json", CommandKind::Download),
            ("upload_request.json", CommandKind::Upload),
            ("terminate_request.json", CommandKind::Terminate),
        ] {
            let line = format!("{}\r\n", fixture_line(name));
            let request =
                decode_request(&line).unwrap_or_else(|e| panic!("{name} did not decode: {e}"));
            let expected = match request {
                Request::Init(_) => CommandKind::Init,
                Request::Download(_) => CommandKind::Download,
                Request::Upload(_) => CommandKind::Upload,
                Request::Terminate => CommandKind::Terminate,
            };
            assert_eq!(expected, kind, "{name}");
        }
    }

    #[test]
    fn download_without_action_is_rejected() {
        let mut value = load_fixture("download_request.json");
        value.as_object_mut().unwrap().remove("action");
        let err = decode_request(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFields {
                command: CommandKind::Download,
                ..
            }
        ));
    }

    // --- Responses ---

    #[test]
    fn fixture_init_responses() {
        let ok = roundtrip_test::<InitResponse>("init_response.json");
        assert!(ok.error.is_none());
        let failed = roundtrip_test::<InitResponse>("init_response_error.json");
        assert_eq!(failed.error.unwrap().code, 32);
    }

    #[test]
    fn fixture_progress_response() {
        let msg = roundtrip_test::<Response>("progress_response.json");
        assert!(!msg.is_terminal());
        assert_eq!(
            msg,
            Response::progress(
                "22ab5f63670800cc7be06dbed816012b0dc411e774754c7579467d2536a9cf3e",
                1234,
                64
            )
        );
    }

    #[test]
    fn fixture_complete_responses() {
        let download = roundtrip_test::<Response>("complete_download_response.json");
        assert!(download.is_terminal());
        assert_eq!(
            download,
            Response::completed(
                "22ab5f63670800cc7be06dbed816012b0dc411e774754c7579467d2536a9cf3e",
                Some(PathBuf::from("/tmp/lfscustomdl123456"))
            )
        );

        let upload = roundtrip_test::<Response>("complete_upload_response.json");
        assert_eq!(upload.oid(), "bf3e3e2af9366a3b704ae0c31de5afa64193ebabffde2091936ad2e7510bc03a");

        let Response::Complete { error, path, .. } =
            roundtrip_test::<Response>("complete_error_response.json")
        else {
            panic!("expected complete");
        };
        assert!(path.is_none());
        assert_eq!(error.unwrap().code, 404);
    }

    #[test]
    fn encoded_responses_match_fixtures() {
        for name in [
            "init_response.json",
            "progress_response.json",
            "complete_download_response.json",
            "complete_upload_response.json",
            "complete_error_response.json",
        ] {
            let fixture = load_fixture(name);
            let line = if name.starts_with("init") {
                let msg: InitResponse = serde_json::from_value(fixture.clone()).unwrap();
                encode_line(&msg).unwrap()
            } else {
                let msg: Response = serde_json::from_value(fixture.clone()).unwrap();
                encode_line(&msg).unwrap()
            };

            assert_eq!(line.last(), Some(&b'\n'), "{name}");
            assert_eq!(line.iter().filter(|b| **b == b'\n').count(), 1, "{name}");
            let decoded: serde_json::Value = serde_json::from_slice(&line).unwrap();
            assert_eq!(decoded, fixture, "{name}");
        }
    }
}
