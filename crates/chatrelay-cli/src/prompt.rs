//! Interactive prompts for the client subcommand.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Why a prompt produced no answer.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Input ended before a line was entered.
    #[error("input closed while waiting for {0}")]
    Closed(&'static str),

    /// Reading the answer or writing the prompt failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Write `question` to `output` and read one line from `input`.
///
/// Only the line terminator (`\n` or `\r\n`) is removed; any other whitespace
/// is part of the answer. `what` names the expected answer in the error
/// raised on end of input.
pub async fn ask<I, O>(
    input: &mut I,
    output: &mut O,
    question: &str,
    what: &'static str,
) -> Result<String, PromptError>
where
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin,
{
    output.write_all(question.as_bytes()).await?;
    output.flush().await?;

    let mut answer = String::new();
    if input.read_line(&mut answer).await? == 0 {
        return Err(PromptError::Closed(what));
    }

    let answer = answer.strip_suffix('\n').unwrap_or(&answer);
    let answer = answer.strip_suffix('\r').unwrap_or(answer);
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_the_line_terminator_is_removed() {
        let mut input: &[u8] = b"  b o b \r\n\tcarol\n";
        let mut output = Vec::new();

        let first = ask(&mut input, &mut output, "nick? ", "nickname").await.unwrap();
        let second = ask(&mut input, &mut output, "nick? ", "nickname").await.unwrap();

        assert_eq!(first, "  b o b ");
        assert_eq!(second, "\tcarol");
        assert_eq!(output, b"nick? nick? ");
    }

    #[tokio::test]
    async fn last_line_without_terminator_is_kept_whole() {
        let mut input: &[u8] = b"alice ";
        let mut output = Vec::new();

        let nickname = ask(&mut input, &mut output, "nick? ", "nickname").await.unwrap();

        assert_eq!(nickname, "alice ");
    }

    #[tokio::test]
    async fn consecutive_prompts_consume_one_line_each() {
        let mut input: &[u8] = b"10.0.0.1\nbob\nhello\n";
        let mut output = Vec::new();

        let host = ask(&mut input, &mut output, "host? ", "address").await.unwrap();
        let nickname = ask(&mut input, &mut output, "nick? ", "nickname").await.unwrap();

        assert_eq!((host.as_str(), nickname.as_str()), ("10.0.0.1", "bob"));
        assert_eq!(output, b"host? nick? ");
        assert_eq!(input, b"hello\n");
    }

    #[tokio::test]
    async fn end_of_input_is_an_error() {
        let mut input: &[u8] = b"";
        let mut output = Vec::new();

        let err = ask(&mut input, &mut output, "nick? ", "nickname").await.unwrap_err();

        assert!(matches!(err, PromptError::Closed("nickname")));
        assert_eq!(err.to_string(), "input closed while waiting for nickname");
    }
}
