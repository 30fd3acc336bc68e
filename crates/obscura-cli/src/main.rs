//! `obscura` — password-based streaming file encryption.
//!
//! Encrypts stdin/file to stdout/file in the self-describing container
//! format; the authentication tag is reported out of band (hex on
//! stderr, a sidecar file, or the archive trailer with `-z`).

use std::fs::File;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use obscura_crypto::{
    decrypt_archive, decrypt_verify, encrypt, encrypt_archive, kdf, Cipher, Error as CryptoError,
    Hash, Header, Kdf, Mac, Mode, PrintFn, Suite, DEFAULT_SEC,
};

#[derive(Parser, Debug)]
#[command(
    name = "obscura",
    version,
    about = "Password-based streaming file encryption",
    disable_help_flag = true
)]
struct Args {
    /// Decrypt instead of encrypt.
    #[arg(short = 'd')]
    decrypt: bool,

    #[arg(short = 'c', value_name = "id", default_value_t = Cipher::Aes256.id(),
          help = format!("cipher ({})", Cipher::options()))]
    cipher: u8,

    #[arg(short = 'm', value_name = "id", default_value_t = Mode::Ctr.id(),
          help = format!("stream mode ({})", Mode::options()))]
    mode: u8,

    #[arg(short = 'k', value_name = "id", default_value_t = Kdf::Argon2id.id(),
          help = format!("key derivation ({})", Kdf::options()))]
    kdf: u8,

    #[arg(short = 'a', value_name = "id", default_value_t = Mac::Hmac.id(),
          help = format!("message authentication ({})", Mac::options()))]
    mac: u8,

    #[arg(short = 'h', value_name = "id", default_value_t = Hash::Sha256.id(),
          help = format!("message digest ({})", Hash::options()))]
    hash: u8,

    #[arg(short = 'e', value_name = "level", default_value_t = DEFAULT_SEC,
          help = format!("security level ({}~{})", obscura_crypto::MIN_SEC, obscura_crypto::MAX_SEC))]
    sec: u8,

    /// Input path (stdin if omitted).
    #[arg(short = 'i', value_name = "path")]
    input: Option<std::path::PathBuf>,

    /// Output path (stdout if omitted).
    #[arg(short = 'o', value_name = "path")]
    output: Option<std::path::PathBuf>,

    /// Tag sidecar path: written on encrypt, read as the expected tag on
    /// decrypt.
    #[arg(short = 's', value_name = "path")]
    sidecar: Option<std::path::PathBuf>,

    /// Expected tag as a hex string (decrypt).
    #[arg(short = 'x', value_name = "hex")]
    expected: Option<String>,

    /// Inline passphrase (prompted otherwise).
    #[arg(short = 'p', value_name = "passphrase")]
    passphrase: Option<String>,

    /// Overwrite existing output files.
    #[arg(short = 'f')]
    overwrite: bool,

    /// Dump the resolved header and key material to stderr.
    #[arg(short = 'v')]
    verbose: bool,

    /// Render a progress meter on stderr.
    #[arg(short = 'P')]
    progress: bool,

    /// Print the tag in hex on stderr.
    #[arg(short = 'X')]
    print_tag: bool,

    /// Archive framing: embed the length-prefixed container and its tag
    /// in the output stream.
    #[arg(short = 'z')]
    archive: bool,

    /// Dry run: resolve the header and keys, then abort before writing
    /// any ciphertext.
    #[arg(short = 'j')]
    dry_run: bool,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let suite = Suite {
        cipher: Cipher::try_from(args.cipher)?,
        mode: Mode::try_from(args.mode)?,
        kdf: Kdf::try_from(args.kdf)?,
        mac: Mac::try_from(args.mac)?,
        hash: Hash::try_from(args.hash)?,
        sec: args.sec,
    };

    let (input, size): (Box<dyn Read>, u64) = match &args.input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("open {}", path.display()))?;
            let meta = file.metadata()?;
            if meta.is_dir() {
                bail!("input is a directory");
            }
            (Box::new(file), meta.len())
        }
        None => (Box::new(io::stdin().lock()), 0),
    };

    let output: Box<dyn Write> = match &args.output {
        Some(path) => {
            if !args.overwrite && path.exists() {
                bail!("output file exists, use -f to overwrite");
            }
            Box::new(File::create(path).with_context(|| format!("create {}", path.display()))?)
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut expected: Option<Vec<u8>> = None;
    if args.decrypt && !args.archive {
        if let Some(path) = &args.sidecar {
            expected = Some(std::fs::read(path)?);
        }
        if let Some(hex_tag) = &args.expected {
            expected = Some(hex::decode(hex_tag).context("expected tag is not valid hex")?);
        }
    } else if let Some(path) = &args.sidecar {
        if !args.decrypt && !args.overwrite && path.exists() {
            bail!("tag file exists, use -f to overwrite");
        }
    }

    let pass = match &args.passphrase {
        Some(pass) => pass.clone().into_bytes(),
        None => prompt_passphrase(!args.decrypt)?,
    };

    let reader: Box<dyn Read> = if args.progress {
        Box::new(ProgressReader::new(input, size))
    } else {
        input
    };

    let verbose = args.verbose;
    let dry_run = args.dry_run;
    let print_fn = move |version: u32,
                         header: &Header,
                         pass: &[u8],
                         key_cipher: &[u8],
                         key_mac: &[u8]|
          -> obscura_crypto::Result<()> {
        if verbose {
            dump_header(version, header, pass, key_cipher, key_mac);
        }
        if dry_run {
            return Err(CryptoError::DryRun);
        }
        Ok(())
    };
    let print: Option<PrintFn<'_>> = if verbose || dry_run {
        Some(&print_fn)
    } else {
        None
    };

    let result = if args.archive {
        if args.decrypt {
            decrypt_archive(reader, output, &pass, print)
                .map(|(tag, trailer)| (tag, Some(trailer)))
        } else {
            encrypt_archive(reader, output, &pass, size, &suite, print).map(|tag| (tag, None))
        }
    } else if args.decrypt {
        decrypt_verify(reader, output, &pass, expected.as_deref(), print)
            .map(|tag| (tag, expected.clone()))
    } else {
        encrypt(reader, output, &pass, &suite, print).map(|tag| (tag, None))
    };

    let (tag, expected) = match result {
        Err(CryptoError::DryRun) => return Ok(()),
        result => result?,
    };

    if args.verbose {
        if let Some(expected) = &expected {
            eprintln!("{:<8}{}", "AUTHEX", hex::encode(expected));
        }
    }
    if args.verbose || args.print_tag {
        eprintln!("{:<8}{}", "AUTHED", hex::encode(&tag));
    }

    if !args.decrypt {
        if let Some(path) = &args.sidecar {
            std::fs::write(path, &tag)?;
        }
    }

    Ok(())
}

fn prompt_passphrase(confirm: bool) -> anyhow::Result<Vec<u8>> {
    loop {
        let pass = rpassword::prompt_password("enter passphrase: ")?;
        if pass.is_empty() {
            continue;
        }
        if confirm {
            let check = rpassword::prompt_password("verify passphrase: ")?;
            if pass != check {
                eprintln!("passphrases do not match");
                continue;
            }
        }
        return Ok(pass.into_bytes());
    }
}

/// Mirrors the header and derived keys onto stderr, one `NAME value`
/// row per field.
fn dump_header(version: u32, header: &Header, pass: &[u8], key_cipher: &[u8], key_mac: &[u8]) {
    let row = |name: &str, value: String| eprintln!("{name:<8}{value}");
    let f = header.get();

    row("VERSION", version.to_string());
    match (Cipher::try_from(f.cipher), Mode::try_from(f.mode)) {
        (Ok(cipher @ Cipher::Aes256), Ok(mode)) => {
            row("CIPHER", format!("{cipher}-{mode}({},{})", f.cipher, f.mode));
        }
        (Ok(cipher), _) => row("CIPHER", format!("{cipher}({})", f.cipher)),
        _ => row("CIPHER", format!("?({})", f.cipher)),
    }
    match Kdf::try_from(f.kdf) {
        Ok(kdf) => row("KDF", format!("{kdf}({})", f.kdf)),
        Err(_) => row("KDF", format!("?({})", f.kdf)),
    }
    match Mac::try_from(f.mac) {
        Ok(mac) => row("MAC", format!("{mac}({})", f.mac)),
        Err(_) => row("MAC", format!("?({})", f.mac)),
    }
    match Hash::try_from(f.hash) {
        Ok(hash) => row("HASH", format!("{hash}({})", f.hash)),
        Err(_) => row("HASH", format!("?({})", f.hash)),
    }
    row("SEC", format!("{}({})", format_size(kdf::memory(f.sec)), f.sec));
    row("SALT", hex::encode(f.salt));
    row("NONCE", hex::encode(f.nonce));
    row(
        "PASS",
        format!("{}({})", String::from_utf8_lossy(pass), hex::encode(pass)),
    );
    row("CIPKEY", hex::encode(key_cipher));
    row("MACKEY", hex::encode(key_mac));
}

fn format_size(n: u64) -> String {
    const SCALES: [(u64, &str); 6] = [
        (1 << 60, "E"),
        (1 << 50, "P"),
        (1 << 40, "T"),
        (1 << 30, "G"),
        (1 << 20, "M"),
        (1 << 10, "K"),
    ];
    for (scale, unit) in SCALES {
        if n >= scale {
            return format!("{:.2}{}B", n as f64 / scale as f64, unit);
        }
    }
    format!("{n}B")
}

/// Counts source bytes through to the wrapped reader and renders them
/// on stderr.
struct ProgressReader<R> {
    inner: R,
    bar: ProgressBar,
}

impl<R: Read> ProgressReader<R> {
    fn new(inner: R, total: u64) -> Self {
        let bar = if total > 0 {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::with_template(
                    "{bytes}/{total_bytes} [{wide_bar}] {bytes_per_sec}",
                )
                .expect("progress template")
                .progress_chars("=>-"),
            );
            bar
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner} {bytes} {bytes_per_sec}")
                    .expect("progress template"),
            );
            bar
        };
        Self { inner, bar }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 {
            self.bar.finish();
        } else {
            self.bar.inc(n as u64);
        }
        Ok(n)
    }
}
