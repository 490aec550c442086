use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP relay
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Bind to 0.0.0.0 instead of 127.0.0.1, exposing the server on all network interfaces
        #[arg(long)]
        public: bool,
    },

    /// Send one message through the relay pipeline and print the envelope
    Send {
        message: String,

        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        max_tokens: i64,
    },

    /// Probe the external chat service
    Health,
}
