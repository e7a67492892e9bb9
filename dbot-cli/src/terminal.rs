//! Terminal reply channel for `dbot ask`: partial renders go to stderr, final text to stdout.

use std::io::Write;

use async_trait::async_trait;
use llm_client::RenderSink;
use plugin_orchestrator::ReplyChannel;

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalReplyChannel;

struct TerminalSink;

#[async_trait]
impl RenderSink for TerminalSink {
    async fn render(&self, text: &str) -> anyhow::Result<()> {
        let mut err = std::io::stderr().lock();
        write!(err, "\r\x1b[2K{}", last_line(text))?;
        err.flush()?;
        Ok(())
    }

    async fn render_final(&self, text: &str) -> anyhow::Result<()> {
        eprint!("\r\x1b[2K");
        println!("{text}");
        Ok(())
    }
}

#[async_trait]
impl ReplyChannel for TerminalReplyChannel {
    async fn open(&self, placeholder: &str) -> anyhow::Result<Box<dyn RenderSink>> {
        eprint!("{placeholder}");
        Ok(Box::new(TerminalSink))
    }

    async fn post(&self, text: &str) -> anyhow::Result<()> {
        println!("{text}");
        Ok(())
    }
}

/// Only the last line is redrawn in place.
fn last_line(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("a\nb\nc*"), "c*");
        assert_eq!(last_line("single"), "single");
        assert_eq!(last_line(""), "");
    }
}
