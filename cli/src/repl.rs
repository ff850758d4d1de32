//! Counter REPL: one graph run per input line until EOF or `exit`/`quit`/`q`.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use recipes::agent::counter::{is_exit_command, CounterSession};

const PROMPT: &str = ">> ";

/// Runs once, then once per line read from stdin.
pub async fn run_counter_repl(session: &CounterSession) -> Result<(), Box<dyn std::error::Error>> {
    run_counter_lines(session, BufReader::new(tokio::io::stdin())).await
}

async fn run_counter_lines<R>(
    session: &CounterSession,
    input: R,
) -> Result<(), Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    let state = session.step().await?;
    println!("{:?}", state);

    let mut lines = input.lines();
    loop {
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if is_exit_command(&line) {
            println!("Exiting...");
            break;
        }
        let state = session.step().await?;
        println!("{:?}", state);
    }
    Ok(())
}
