//! Running external extraction tools.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use aieval_core::error::ExtractError;

/// Run `program` with `args` and return its stdout.
///
/// A missing binary, a non-zero exit and a timeout are all errors; the child
/// is killed when the timeout fires.
pub async fn run_tool<I, S>(program: &str, args: I, timeout: Duration) -> Result<Vec<u8>, ExtractError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::trace!("running {program}");
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(ExtractError::ToolTimeout {
                tool: program.to_string(),
                secs: timeout.as_secs(),
            })
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ExtractError::ToolFailed {
                tool: program.to_string(),
                message: "not found on PATH".to_string(),
            })
        }
        Ok(Err(e)) => {
            return Err(ExtractError::ToolFailed {
                tool: program.to_string(),
                message: e.to_string(),
            })
        }
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::ToolFailed {
            tool: program.to_string(),
            message: format!("{}: {}", output.status, stderr.trim()),
        });
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary() {
        let err = run_tool("aieval-no-such-tool", ["x"], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ToolFailed { ref message, .. } if message.contains("PATH")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_stdout() {
        let out = run_tool("echo", ["hello"], Duration::from_secs(5)).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let err = run_tool("false", Vec::<&str>::new(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ToolFailed { ref tool, .. } if tool == "false"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_tool_times_out() {
        let err = run_tool("sleep", ["5"], Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ToolTimeout { ref tool, .. } if tool == "sleep"));
    }
}
