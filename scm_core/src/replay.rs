use std::io::BufRead;

use scm_api::ScmMainRequest;
use scm_plugin_api::{dispatch, ScmMain};
use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

/// Counters reported by [`replay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    /// Messages dispatched to the host.
    pub messages: usize,
    /// Blank lines that were skipped.
    pub skipped_lines: usize,
}

/// Feed a newline-delimited log of wire messages to `host`, in order.
///
/// Each non-blank line holds one JSON message (`{"method": ..., "params": ...}`).
///
/// # Errors
///
/// Stops at the first line that cannot be read ([`Error::Read`]) or decoded
/// ([`Error::Decode`]). Messages before it have already been dispatched.
pub fn replay<R: BufRead>(reader: R, host: &dyn ScmMain) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|source| Error::Read {
            line: line_no,
            source,
        })?;
        if line.trim().is_empty() {
            stats.skipped_lines += 1;
            continue;
        }
        let request: ScmMainRequest =
            serde_json::from_str(&line).map_err(|source| Error::Decode {
                line: line_no,
                source,
            })?;
        debug!(line = line_no, method = request.method(), "Replaying SCM message");
        dispatch(request, host);
        stats.messages += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use scm_api::{Handle, ProviderDescriptor, ScmProviderFeatures};

    use super::*;

    #[derive(Default)]
    struct Log(Mutex<Vec<String>>);

    impl Log {
        fn push(&self, entry: String) {
            self.0.lock().expect("log lock").push(entry);
        }
    }

    impl ScmMain for Log {
        fn register_source_control(&self, handle: Handle, descriptor: ProviderDescriptor) {
            self.push(format!("register {handle} {}", descriptor.label));
        }

        fn update_source_control(&self, handle: Handle, features: ScmProviderFeatures) {
            self.push(format!("update {handle} {:?}", features.count));
        }

        fn unregister_source_control(&self, handle: Handle) {
            self.push(format!("unregister {handle}"));
        }

        fn set_input_box_placeholder(&self, handle: Handle, _placeholder: String) {
            self.push(format!("placeholder {handle}"));
        }

        fn set_input_box_value(&self, handle: Handle, _value: String) {
            self.push(format!("value {handle}"));
        }
    }

    #[test]
    fn dispatches_each_line_and_skips_blanks() {
        let input = concat!(
            r#"{"method":"$registerSourceControl","params":{"handle":0,"id":"git","label":"Git","rootUri":"/repo"}}"#,
            "\n\n",
            r#"{"method":"$updateSourceControl","params":{"handle":0,"features":{"count":4}}}"#,
            "\n",
            r#"{"method":"$unregisterSourceControl","params":{"handle":0}}"#,
            "\n",
        );
        let log = Log::default();

        let stats = replay(input.as_bytes(), &log).expect("replay");

        assert_eq!(
            stats,
            ReplayStats {
                messages: 3,
                skipped_lines: 1
            }
        );
        assert_eq!(
            *log.0.lock().expect("log lock"),
            vec!["register 0 Git", "update 0 Set(4)", "unregister 0"]
        );
    }

    #[test]
    fn reports_the_line_of_a_malformed_message() {
        let input = "{\"method\":\"$unregisterSourceControl\",\"params\":{\"handle\":1}}\n{\"method\":\"$nope\"}\n";
        let log = Log::default();

        match replay(input.as_bytes(), &log) {
            Err(Error::Decode { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a decode error, got {other:?}"),
        }
        assert_eq!(*log.0.lock().expect("log lock"), vec!["unregister 1"]);
    }
}
