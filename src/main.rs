use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "pdf-translator",
    version,
    about = "Translate a PDF via DeepL while preserving formatting and images"
)]
struct Cli {
    /// Path to the PDF file to translate
    #[arg(required_unless_present = "show_supported_languages")]
    pdf_path: Option<String>,

    /// Target language code (e.g. DE, FR, SK)
    #[arg(required_unless_present = "show_supported_languages")]
    target_lang: Option<String>,

    /// DeepL API authentication key (falls back to DEEPL_AUTH_KEY)
    #[arg(short = 'k', long = "auth-key")]
    auth_key: Option<String>,

    /// Path for the translated PDF (default: <stem>_<LANG>.pdf)
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Source language code. Use "auto" to detect.
    #[arg(short = 'L', long = "source-lang", default_value = "auto")]
    source_lang: String,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Keep the translated DOCX next to the output
    #[arg(long = "keep-intermediate")]
    keep_intermediate: bool,

    /// Show supported target languages and exit
    #[arg(long = "show-supported-languages")]
    show_supported_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    pdf_translator::logging::init(cli.verbose);

    let output = pdf_translator::run(pdf_translator::Config {
        pdf_path: cli.pdf_path,
        target_lang: cli.target_lang,
        auth_key: cli.auth_key,
        output: cli.output,
        source_lang: cli.source_lang,
        settings_path: cli.read_settings,
        keep_intermediate: cli.keep_intermediate,
        show_supported_languages: cli.show_supported_languages,
    })
    .await?;

    println!("{}", output);
    Ok(())
}
