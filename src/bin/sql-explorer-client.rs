//! Terminal client for the SQL explorer MCP server.
//!
//! Spawns the server command, prints the schema as a tree and then runs SQL
//! typed on stdin, one statement per line.
//!
//! ```text
//! sql-explorer-client -- sql-explorer-mcp --database-url sqlite:app.db
//! ```

use clap::Parser;
use sql_explorer_mcp::client::ExplorerClient;
use sql_explorer_mcp::error::DbResult;
use sql_explorer_mcp::tools::{OutputFormat, render};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands:
  \\schema   reload and print the schema
  \\close    close the session and exit (also \\q)
  \\help     show this message
Anything else is sent to the server as SQL.";

#[derive(Parser, Debug)]
#[command(name = "sql-explorer-client")]
#[command(version, about = "Interactive terminal client for sql-explorer-mcp")]
struct Args {
    /// How query results are printed
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log level for the client itself (logs go to stderr)
    #[arg(long, env = "MCP_CLIENT_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Server command and its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    server: Vec<String>,
}

enum Input {
    Sql(String),
    Schema,
    Help,
    Close,
    Skip,
}

fn classify(line: &str) -> Input {
    match line.trim() {
        "" => Input::Skip,
        "\\schema" => Input::Schema,
        "\\help" | "\\?" => Input::Help,
        "\\close" | "\\q" => Input::Close,
        sql => Input::Sql(sql.to_string()),
    }
}

async fn print_schema(client: &ExplorerClient) {
    match client.fetch_schema().await {
        Ok(schema) if schema.is_empty() => println!("(no tables)"),
        Ok(schema) => print!("{}", schema.render_tree()),
        Err(e) => println!("Error: {}", e.message()),
    }
}

fn prompt() {
    print!("sql> ");
    let _ = std::io::stdout().flush();
}

async fn run(args: Args) -> DbResult<()> {
    let mut parts = args.server.iter();
    let mut command = match parts.next() {
        Some(program) => Command::new(program),
        None => return Ok(()),
    };
    command.args(parts);

    let client = ExplorerClient::spawn(command).await?;
    print_schema(&client).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin");
                break;
            }
        };

        match classify(&line) {
            Input::Skip => {}
            Input::Schema => print_schema(&client).await,
            Input::Help => println!("{}", HELP),
            Input::Close => break,
            Input::Sql(sql) => match client.execute_query(&sql).await {
                Ok(result) => println!("{}", render(&result, args.format)),
                Err(e) => println!("Error: {}", e.message()),
            },
        }
        prompt();
    }

    println!();
    client.close().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Client failed");
            eprintln!("Error: {}", e.message());
            ExitCode::FAILURE
        }
    }
}
