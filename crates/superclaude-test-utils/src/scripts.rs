//! Shell-script bodies for fake agents.
//!
//! Each function returns a POSIX `sh` script. [`TestProject`] installs them
//! as `<agent>/dist/index.js` and runs them with `sh`, so real subprocess
//! tests need no JavaScript runtime.
//!
//! [`TestProject`]: crate::TestProject

use std::path::Path;

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Read the request, print `body`, exit 0.
pub fn respond(body: &str) -> String {
    format!("cat > /dev/null\nprintf '%s\\n' {}\n", quote(body))
}

/// Reply with the request itself as `data.request`.
pub fn echo_request() -> String {
    concat!(
        "input=$(cat)\n",
        "printf '{\"status\":\"success\",\"data\":{\"request\":%s}}\\n' \"$input\"\n",
    )
    .to_string()
}

/// Print `stderr` to stderr and exit with `code`.
pub fn exit_with(code: i32, stderr: &str) -> String {
    format!("cat > /dev/null\nprintf '%s\\n' {} >&2\nexit {}\n", quote(stderr), code)
}

/// Print `stdout` and exit with `code`.
pub fn print_and_exit(stdout: &str, code: i32) -> String {
    format!("cat > /dev/null\nprintf '%s\\n' {}\nexit {}\n", quote(stdout), code)
}

/// Exit 1 on the first `failures` runs, then print `body`.
///
/// Runs are counted in `counter`, which also lets a test see how many
/// times the agent was started.
pub fn flaky(counter: &Path, failures: u32, body: &str) -> String {
    let counter = quote(&counter.display().to_string());
    format!(
        "cat > /dev/null\n\
         n=$(cat {counter} 2>/dev/null || echo 0)\n\
         n=$((n + 1))\n\
         echo \"$n\" > {counter}\n\
         if [ \"$n\" -le {failures} ]; then\n  echo \"attempt $n failed\" >&2\n  exit 1\nfi\n\
         printf '%s\\n' {body}\n",
        body = quote(body),
    )
}

/// Print `partial`, record the pid in `pid_file`, then hang.
///
/// `exec` keeps the recorded pid pointing at the sleeping process.
pub fn hang(pid_file: &Path, partial: &str) -> String {
    format!(
        "printf '%s\\n' {}\necho $$ > {}\nexec sleep 60\n",
        quote(partial),
        quote(&pid_file.display().to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_escapes_single_quotes() {
        assert_eq!(quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_respond_quotes_body() {
        let script = respond(r#"{"status":"success","data":{}}"#);
        assert!(script.contains(r#"'{"status":"success","data":{}}'"#));
    }
}
