use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::AgentEngine;

const EXIT_WORDS: &[&str] = &["exit", "quit", "bye"];

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.contains(&input.to_lowercase().as_str())
}

/// Interactive read/respond loop on stdin. Delegate errors are printed and
/// the loop keeps going; EOF or an exit word ends the session.
pub async fn run(engine: Arc<AgentEngine>) -> Result<()> {
    use std::io::Write;

    let tokens = engine.knowledge().token_count().await;
    println!("🐾 Sniffle's Fundamental Analysis Engine Initialized!");
    println!("📊 Knowledge base loaded with {} analyzed tokens", tokens);
    println!("🐶 Ask me about any token for full fundamental analysis!");
    println!("💡 Try: 'What's the risk level of PEPE?' or 'Give me a safe memecoin recommendation'");
    println!("{}", "=".repeat(60));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            println!("\n🐶 Sniffle: Woof woof! Thanks for letting me help with your crypto analysis! Stay safe out there! 🐾");
            break;
        }

        match engine.respond(input).await {
            Ok(response) => {
                println!("\n🐶 Sniffle: {}\n", response);
                println!("{}\n", "=".repeat(50));
            }
            Err(e) => {
                eprintln!("\n❌ Error: {}", e);
                eprintln!("🐕 Let me try again... My nose might have gotten confused!");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(is_exit("Bye"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("what is DOGE"));
    }
}
