use std::io;
use std::net::{IpAddr, SocketAddr};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use implied_growth::api::{self, ApiRequest};
use implied_growth::core::{InputSet, RawInputs, ShareOutcome, permalink_url, share_permalink};

#[derive(Parser, Debug)]
#[command(
    name = "implied-growth",
    about = "Reverse DCF: the perpetual growth rate a share price implies under the value driver formula"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the calculator page and JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        #[arg(long, default_value = "0.0.0.0")]
        bind: IpAddr,
    },
    /// Evaluate one set of inputs and print the report
    Eval {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(
            long,
            default_value_t = 0.0,
            allow_hyphen_values = true,
            help = "Trial growth rate in percent, clamped to the feasible range"
        )]
        trial_growth: f64,
        #[arg(long, help = "Print the API JSON body instead of the text report")]
        json: bool,
    },
    /// Print a shareable permalink for the inputs
    Link {
        #[command(flatten)]
        inputs: InputArgs,
        #[arg(long, default_value = "http://127.0.0.1:8080/")]
        base_url: String,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    #[arg(long, default_value = "€", help = "Currency symbol used for display only")]
    currency: String,
    #[arg(
        long,
        default_value = "",
        allow_hyphen_values = true,
        help = "Market price per share"
    )]
    price: String,
    #[arg(
        long,
        default_value = "",
        allow_hyphen_values = true,
        help = "Shares outstanding in billions"
    )]
    shares_b: String,
    #[arg(
        long,
        default_value = "",
        allow_hyphen_values = true,
        help = "Net debt in billions; negative for net cash"
    )]
    net_debt_b: String,
    #[arg(long, default_value = "", allow_hyphen_values = true, help = "WACC in percent, e.g. 8")]
    wacc: String,
    #[arg(long, default_value = "", allow_hyphen_values = true, help = "ROIC in percent, e.g. 15")]
    roic: String,
    #[arg(
        long,
        default_value = "",
        allow_hyphen_values = true,
        help = "Normalized NOPAT in billions"
    )]
    nopat_b: String,
}

impl InputArgs {
    fn to_input_set(&self) -> InputSet {
        InputSet::from_raw(&RawInputs {
            currency: self.currency.clone(),
            price: self.price.clone(),
            shares_outstanding_b: self.shares_b.clone(),
            net_debt_b: self.net_debt_b.clone(),
            wacc_pct: self.wacc.clone(),
            roic_pct: self.roic.clone(),
            nopat_b: self.nopat_b.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port, bind } => {
            let addr = SocketAddr::new(bind, port);
            if let Err(e) = api::run_http_server(addr).await {
                error!("{e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Command::Eval {
            inputs,
            trial_growth,
            json,
        } => {
            let request = ApiRequest {
                inputs: inputs.to_input_set(),
                trial_growth: trial_growth / 100.0,
            };
            let response = api::build_evaluate_response(&request);
            if json {
                match serde_json::to_string_pretty(&response) {
                    Ok(body) => println!("{body}"),
                    Err(e) => {
                        error!("failed to serialize response: {e}");
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                println!("{}", response.display);
            }
            ExitCode::SUCCESS
        }
        Command::Link { inputs, base_url } => {
            let url = permalink_url(&base_url, &inputs.to_input_set());
            match share_permalink(&mut io::stdout().lock(), &url) {
                ShareOutcome::Copied => {
                    info!("{}", ShareOutcome::Copied.message());
                    ExitCode::SUCCESS
                }
                ShareOutcome::Failed => {
                    error!("{}", ShareOutcome::Failed.message());
                    ExitCode::FAILURE
                }
            }
        }
    }
}
