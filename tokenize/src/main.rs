//! 形態素解析を実行するユーティリティ
//!
//! このバイナリは、標準入力から読み込んだテキストを行ごとに形態素解析し、
//! 指定された出力形式（mecab、wakati、detail）で結果を出力します。

use std::error::Error;
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use hinoki::{Dictionary, DictionaryPaths, MecabRc, Token, Tokenizer};

use clap::Parser;
use regex::Regex;

static NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\n\r|\n|\r").unwrap());

/// 出力モード
#[derive(Clone, Debug)]
enum OutputMode {
    Mecab,
    Wakati,
    Detail,
}

/// `OutputMode` の `FromStr` 実装
impl FromStr for OutputMode {
    type Err = &'static str;

    /// 文字列から出力モードをパースする
    ///
    /// # 引数
    ///
    /// * `mode` - パース対象の文字列（"mecab"、"wakati"、"detail"のいずれか）
    ///
    /// # 戻り値
    ///
    /// パースに成功した場合は対応する `OutputMode`、失敗した場合はエラーメッセージ
    fn from_str(mode: &str) -> Result<Self, Self::Err> {
        match mode {
            "mecab" => Ok(Self::Mecab),
            "wakati" => Ok(Self::Wakati),
            "detail" => Ok(Self::Detail),
            _ => Err("Could not parse a mode"),
        }
    }
}

/// コマンドライン引数
#[derive(Parser, Debug)]
#[clap(name = "tokenize", about = "Predicts morphemes with a MeCab dictionary")]
struct Args {
    /// Resource file (mecabrc). Searched in $MECABRC and the default locations if omitted.
    #[clap(short = 'r', long)]
    rcfile: Option<PathBuf>,

    /// Dictionary directory. Overrides `dicdir` in the resource file.
    #[clap(short = 'd', long)]
    dicdir: Option<PathBuf>,

    /// User dictionary. Overrides `userdic` in the resource file.
    #[clap(short = 'u', long)]
    userdic: Option<PathBuf>,

    /// Number of best segmentations to print for each line.
    #[clap(short = 'N', long, default_value = "1")]
    nbest: usize,

    /// Output mode. Choices are mecab, wakati, and detail.
    #[clap(short = 'O', long, default_value = "mecab")]
    output_mode: OutputMode,

    /// Increases the log level. Repeat for more detail.
    #[clap(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 引数から辞書ファイルのパスを解決する
///
/// `--dicdir` が指定されている場合は、設定ファイルが見つからなくても続行します。
fn resolve_paths(args: &Args) -> Result<DictionaryPaths, Box<dyn Error>> {
    let mut rc = match MecabRc::find(args.rcfile.as_deref()) {
        Ok(rc) => rc,
        Err(e) if args.dicdir.is_some() && args.rcfile.is_none() => {
            log::info!("{e}");
            MecabRc::default()
        }
        Err(e) => return Err(e.into()),
    };
    if let Some(dicdir) = &args.dicdir {
        rc.set("dicdir", dicdir.to_string_lossy());
    }
    if let Some(userdic) = &args.userdic {
        rc.set("userdic", userdic.to_string_lossy());
    }
    Ok(DictionaryPaths::from_mecabrc(&rc)?)
}

/// 1つの解析結果を出力する
fn write_tokens<'w, W, I>(out: &mut W, tokens: I, mode: &OutputMode) -> std::io::Result<()>
where
    W: Write,
    I: Iterator<Item = Token<'w>>,
{
    match mode {
        OutputMode::Mecab => {
            for t in tokens {
                out.write_all(t.surface().as_bytes())?;
                out.write_all(b"\t")?;
                out.write_all(t.feature().as_bytes())?;
                out.write_all(b"\n")?;
            }
            out.write_all(b"EOS\n")?;
        }
        OutputMode::Wakati => {
            for (i, t) in tokens.enumerate() {
                if i != 0 {
                    out.write_all(b" ")?;
                }
                out.write_all(t.surface().as_bytes())?;
            }
            out.write_all(b"\n")?;
        }
        OutputMode::Detail => {
            for t in tokens {
                writeln!(
                    out,
                    "{}\t{}\tlex_type={:?}\tleft_id={}\tright_id={}\tword_cost={}\ttotal_cost={}",
                    t.surface(),
                    t.feature(),
                    t.lex_type(),
                    t.left_id(),
                    t.right_id(),
                    t.word_cost(),
                    t.total_cost(),
                )?;
            }
            out.write_all(b"EOS\n")?;
        }
    }
    Ok(())
}

/// メイン関数
///
/// 辞書をロードし、標準入力から読み込んだテキストを形態素解析して、
/// 指定された形式で結果を標準出力に出力します。
///
/// # 戻り値
///
/// 実行が成功した場合は `Ok(())`、エラーが発生した場合はエラー情報
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("Loading the dictionary...");
    let paths = resolve_paths(&args)?;
    let dict = Dictionary::from_paths(&paths)?;

    let tokenizer = Tokenizer::new(dict);
    let mut worker = tokenizer.new_worker();

    log::info!("Ready to tokenize");

    let is_tty = atty::is(atty::Stream::Stdout);

    let mut input = String::new();
    std::io::stdin().lock().read_to_string(&mut input)?;
    let mut lines: Vec<&str> = NEWLINE.split(&input).collect();
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in lines {
        worker.reset_sentence(line);
        if args.nbest <= 1 {
            worker.tokenize()?;
            write_tokens(&mut out, worker.token_iter(), &args.output_mode)?;
        } else {
            worker.tokenize_nbest(args.nbest)?;
            for i in 0..worker.num_nbest_paths() {
                if let Some(tokens) = worker.nbest_token_iter(i) {
                    write_tokens(&mut out, tokens, &args.output_mode)?;
                }
            }
        }
        if is_tty {
            out.flush()?;
        }
    }

    Ok(())
}
