//! Interactive calculator session.
//!
//! One event is handled at a time: an input line, the history recorder's
//! deadline or the periodic rate refresh. Completed conversions reach the
//! history store only through the recorder.
use super::labels::Labels;
use super::{convert, history, ui};
use crate::core::config::Language;
use crate::core::{
    Calculator, Currency, CurrencySet, HistoryRecorder, HistoryStore, RateBoard, RateSource,
};
use anyhow::{Result, bail};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tracing::{debug, info, warn};

const HELP: &str = "\
Commands:
  amount <n>     set the amount, e.g. `amount 1,500`
  rate <n>       enter a rate manually
  auto           use the market rate
  manual         keep the current rate and stop following the market
  from <code>    select the source currency
  to <code>      select the target currency
  swap           exchange source and target
  refresh        fetch new market rates
  show           show the current conversion
  history        list saved conversions
  clear          clear saved conversions
  lang           switch labels between English and Myanmar
  help           show this help
  quit           leave the calculator";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Amount(String),
    Rate(String),
    Automatic,
    Manual,
    From(Currency),
    To(Currency),
    Swap,
    Refresh,
    Show,
    History,
    Clear,
    ToggleLanguage,
    Help,
    Quit,
}

/// Parses one input line. Amount and rate text is passed on verbatim so the
/// calculator sees exactly what was typed.
pub fn parse_command(line: &str, currencies: &CurrencySet) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_lowercase().as_str() {
        "amount" | "a" => Command::Amount(rest.to_string()),
        "rate" | "r" => Command::Rate(rest.to_string()),
        "auto" => Command::Automatic,
        "manual" => Command::Manual,
        "from" => Command::From(currencies.parse(rest)?),
        "to" => Command::To(currencies.parse(rest)?),
        "swap" | "s" => Command::Swap,
        "refresh" => Command::Refresh,
        "show" | "" => Command::Show,
        "history" | "h" => Command::History,
        "clear" => Command::Clear,
        "lang" | "language" => Command::ToggleLanguage,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => {
            // A bare number is the most common input
            if other.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                Command::Amount(line.to_string())
            } else {
                bail!("Unknown command: {}", word)
            }
        }
    };
    Ok(command)
}

pub struct Session<'a, W: Write> {
    calculator: Calculator,
    recorder: HistoryRecorder,
    board: &'a RateBoard,
    source: &'a dyn RateSource,
    store: &'a dyn HistoryStore,
    language: Language,
    labels: &'static Labels,
    out: W,
}

impl<'a, W: Write> Session<'a, W> {
    pub fn new(
        currencies: CurrencySet,
        board: &'a RateBoard,
        source: &'a dyn RateSource,
        store: &'a dyn HistoryStore,
        out: W,
    ) -> Self {
        let calculator = Calculator::new(currencies, board.snapshot().table.clone());
        Self {
            calculator,
            recorder: HistoryRecorder::new(),
            board,
            source,
            store,
            language: Language::En,
            labels: Labels::for_language(Language::En),
            out,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.set_language(language);
        self
    }

    fn set_language(&mut self, language: Language) {
        self.language = language;
        self.labels = Labels::for_language(language);
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Runs until `quit` or until the input channel closes. A save that is
    /// still pending at that point is dropped.
    pub async fn run(
        mut self,
        mut input: mpsc::Receiver<String>,
        refresh_every: Duration,
    ) -> Result<W> {
        let refresh_every = refresh_every.max(Duration::from_secs(1));
        let mut refresh = interval_at(Instant::now() + refresh_every, refresh_every);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.print_status()?;
        loop {
            let deadline = self.recorder.deadline();
            tokio::select! {
                line = input.recv() => {
                    let Some(line) = line else { break };
                    if !self.handle_line(&line).await? {
                        break;
                    }
                }
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.save_due()?;
                }
                _ = refresh.tick() => {
                    debug!("Periodic rate refresh");
                    self.refresh().await?;
                }
            }
        }

        self.recorder.shutdown();
        Ok(self.out)
    }

    /// Handles one line of input. Returns `false` when the session should end.
    pub async fn handle_line(&mut self, line: &str) -> Result<bool> {
        let command = match parse_command(line, self.calculator.currencies()) {
            Ok(command) => command,
            Err(e) => {
                writeln!(self.out, "{}", ui::style_text(&e.to_string(), ui::StyleType::Error))?;
                return Ok(true);
            }
        };

        let before = self.calculator.observation();
        match command {
            Command::Amount(text) => self.calculator.set_amount_text(text),
            Command::Rate(text) => self.calculator.set_rate_text(text),
            Command::Automatic => self.calculator.set_automatic(true),
            Command::Manual => self.calculator.set_automatic(false),
            Command::From(currency) => self.calculator.select_source(currency),
            Command::To(currency) => self.calculator.select_target(currency),
            Command::Swap => self.calculator.swap(),
            Command::Refresh => {
                self.refresh().await?;
                return Ok(true);
            }
            Command::Show => {}
            Command::History => {
                let records = self.store.list()?;
                let local = self.calculator.currencies().local_code();
                writeln!(
                    self.out,
                    "{}",
                    history::render_history(&records, local, self.labels)
                )?;
                return Ok(true);
            }
            Command::Clear => {
                self.store.clear()?;
                writeln!(self.out, "{}", self.labels.history_cleared)?;
                return Ok(true);
            }
            Command::ToggleLanguage => self.set_language(self.language.toggled()),
            Command::Help => {
                writeln!(self.out, "{HELP}")?;
                return Ok(true);
            }
            Command::Quit => return Ok(false),
        }

        self.observe_if_changed(before);
        self.print_status()?;
        Ok(true)
    }

    async fn refresh(&mut self) -> Result<()> {
        let before = self.calculator.observation();
        let snapshot = self.board.refresh(self.source).await;
        self.calculator.apply_rates(snapshot.table.clone());
        self.observe_if_changed(before);
        writeln!(
            self.out,
            "{}",
            ui::style_text(
                &format!("Rates as of {}", snapshot.as_of.format("%H:%M:%S UTC")),
                ui::StyleType::Subtle
            )
        )?;
        self.print_status()
    }

    fn observe_if_changed(&mut self, before: crate::core::Observation) {
        let after = self.calculator.observation();
        if after != before {
            self.recorder.observe(after, Instant::now());
        }
    }

    /// A record the store rejects is lost; the session carries on.
    fn save_due(&mut self) -> Result<()> {
        let Some(record) = self.recorder.poll(Instant::now()) else {
            return Ok(());
        };
        info!(id = record.id, from = %record.from, to = %record.to, "Saving conversion to history");
        if let Err(e) = self.store.append(record) {
            warn!(error = %e, "Failed to save history");
            writeln!(
                self.out,
                "{}",
                ui::style_text(
                    &format!("{}: {e}", self.labels.save_failed),
                    ui::StyleType::Error
                )
            )?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let currencies = self.calculator.currencies();
        let header = format!(
            "{} -> {} | {} {} ({})",
            currencies.code_of(self.calculator.source()),
            currencies.code_of(self.calculator.target()),
            self.labels.rate,
            if self.calculator.rate_text().is_empty() {
                "?"
            } else {
                self.calculator.rate_text()
            },
            self.labels.rate_mode(self.calculator.is_automatic())
        );
        let body = convert::render_conversion(&self.calculator, self.labels);
        writeln!(
            self.out,
            "{}\n{}",
            ui::style_text(&header, ui::StyleType::Subtle),
            body
        )?;
        Ok(())
    }
}

/// Forwards lines from `reader` until EOF or until the receiver is gone.
///
/// Reading happens on a detached OS thread. A read blocked on a terminal
/// never holds up process exit the way a runtime blocking task would.
pub fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(
    currencies: CurrencySet,
    board: &RateBoard,
    source: &dyn RateSource,
    store: &dyn HistoryStore,
    refresh_every: Duration,
    language: Language,
) -> Result<()> {
    let labels = Labels::for_language(language);
    println!("{}", ui::style_text(labels.app_title, ui::StyleType::Title));
    println!("Type `help` for commands.\n");

    let session = Session::new(currencies, board, source, store, std::io::stdout())
        .with_language(language);
    let input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    session.run(input, refresh_every).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RateTable;
    use crate::core::currency::{code, test_set};
    use crate::core::HistoryRecord;
    use crate::store::memory::MemoryHistoryStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StepSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateSource for StepSource {
        async fn fetch_rates(&self) -> Result<RateTable> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as f64;
            Ok(table().with_rate(code("THB"), 133.0 + call))
        }
    }

    fn table() -> RateTable {
        RateTable::new()
            .with_rate(code("THB"), 132.0)
            .with_rate(code("USD"), 4500.0)
    }

    fn source() -> StepSource {
        StepSource {
            calls: AtomicUsize::new(0),
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    async fn send(tx: &mpsc::Sender<String>, line: &str, pause_ms: u64) {
        tx.send(line.to_string()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(pause_ms)).await;
    }

    #[test]
    fn test_parse_command() {
        let set = test_set();
        assert_eq!(
            parse_command("amount 1,500", &set).unwrap(),
            Command::Amount("1,500".to_string())
        );
        assert_eq!(
            parse_command("1500", &set).unwrap(),
            Command::Amount("1500".to_string())
        );
        assert_eq!(
            parse_command("rate 4,500", &set).unwrap(),
            Command::Rate("4,500".to_string())
        );
        assert_eq!(parse_command("amount", &set).unwrap(), Command::Amount(String::new()));
        assert_eq!(parse_command("FROM mmk", &set).unwrap(), Command::From(Currency::Local));
        assert_eq!(
            parse_command("to usd", &set).unwrap(),
            Command::To(Currency::Foreign(code("USD")))
        );
        assert_eq!(parse_command("", &set).unwrap(), Command::Show);
        assert_eq!(parse_command("q", &set).unwrap(), Command::Quit);
        assert!(parse_command("to jpy", &set).is_err());
        assert!(parse_command("dance", &set).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_save() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            // Keystrokes arrive faster than the debounce delay
            send(&tx, "amount 1", 300).await;
            send(&tx, "amount 10", 300).await;
            send(&tx, "amount 100", 2500).await;
            send(&tx, "quit", 0).await;
        });

        let out = session.run(rx, HOUR).await.unwrap();
        handle.await.unwrap();

        let records = store.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, 100.0);
        assert_eq!(records[0].result, 13200.0);
        assert_eq!(records[0].from.as_str(), "THB");
        assert_eq!(records[0].to.as_str(), "MMK");
        assert!(String::from_utf8(out).unwrap().contains("13,200"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_input_saves_once() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            for _ in 0..5 {
                send(&tx, "amount 100", 500).await;
            }
            send(&tx, "show", 2500).await;
            send(&tx, "amount 100", 2500).await;
            send(&tx, "quit", 0).await;
        });

        session.run(rx, HOUR).await.unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_drops_pending_save() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            send(&tx, "amount 100", 1000).await;
            send(&tx, "quit", 0).await;
        });

        session.run(rx, HOUR).await.unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_input_drops_pending_save() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tx.send("amount 100".to_string()).await.unwrap();
        drop(tx);

        session.run(rx, HOUR).await.unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_and_manual_rate_flow() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            send(&tx, "swap", 0).await;
            send(&tx, "13200", 2100).await;
            send(&tx, "from usd", 0).await;
            send(&tx, "rate 4,500", 0).await;
            send(&tx, "amount 1,500", 2100).await;
            send(&tx, "quit", 0).await;
        });

        session.run(rx, HOUR).await.unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);

        // Newest first
        assert_eq!(records[0].from.as_str(), "USD");
        assert_eq!(records[0].to.as_str(), "MMK");
        assert_eq!(records[0].result, 6_750_000.0);

        assert_eq!(records[1].from.as_str(), "MMK");
        assert_eq!(records[1].to.as_str(), "THB");
        assert!((records[1].result - 100.0).abs() < 1e-9);
        assert!(records[0].id > records[1].id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_refresh_updates_automatic_rate() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            send(&tx, "amount 100", 2500).await;
            // The refresh at 60s changes the synced rate, which is a new calculation
            tokio::time::sleep(Duration::from_secs(60)).await;
            send(&tx, "quit", 0).await;
        });

        session.run(rx, Duration::from_secs(60)).await.unwrap();
        let records = store.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].rate, 133.0);
        assert_eq!(records[1].rate, 132.0);
        assert_eq!(board.snapshot().table.get(&code("THB")), Some(133.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_rate_survives_refresh() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let mut session = Session::new(test_set(), &board, &source, &store, Vec::new());

        session.handle_line("rate 140").await.unwrap();
        session.handle_line("refresh").await.unwrap();
        assert_eq!(session.calculator().rate_text(), "140");
        assert_eq!(session.calculator().table().get(&code("THB")), Some(133.0));

        session.handle_line("auto").await.unwrap();
        assert_eq!(session.calculator().rate_text(), "133");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_input_keeps_session_alive() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let mut session = Session::new(test_set(), &board, &source, &store, Vec::new());

        assert!(session.handle_line("to jpy").await.unwrap());
        assert!(session.handle_line("help").await.unwrap());
        assert!(!session.handle_line("quit").await.unwrap());
        let out = String::from_utf8(session.out).unwrap();
        assert!(out.contains("Unsupported currency: JPY"));
        assert!(out.contains("Commands:"));
    }

    struct FullDiskStore;

    impl HistoryStore for FullDiskStore {
        fn append(&self, _record: HistoryRecord) -> Result<()> {
            Err(anyhow!("No space left on device"))
        }
        fn clear(&self) -> Result<()> {
            Ok(())
        }
        fn list(&self) -> Result<Vec<HistoryRecord>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_keeps_session_running() {
        let board = RateBoard::new(table());
        let source = source();
        let session = Session::new(test_set(), &board, &source, &FullDiskStore, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(async move {
            send(&tx, "amount 100", 2500).await;
            send(&tx, "amount 200", 0).await;
            send(&tx, "quit", 0).await;
        });

        let out = session.run(rx, HOUR).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Could not save to history: No space left on device"));
        // Input after the failure is still handled
        assert!(out.contains("26,400"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_returns_while_input_is_open() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let session = Session::new(test_set(), &board, &source, &store, Vec::new());

        let (tx, rx) = mpsc::channel(16);
        tx.send("amount 100".to_string()).await.unwrap();
        tx.send("quit".to_string()).await.unwrap();

        let finished = tokio::time::timeout(Duration::from_secs(5), session.run(rx, HOUR)).await;
        assert!(finished.is_ok(), "session did not stop on quit");
        finished.unwrap().unwrap();
        // The session let go of the channel while the sender is still alive
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_line_reader_forwards_until_eof() {
        let mut rx = spawn_line_reader(Cursor::new("amount 1,500\nswap\nquit\n"));
        assert_eq!(rx.recv().await.as_deref(), Some("amount 1,500"));
        assert_eq!(rx.recv().await.as_deref(), Some("swap"));
        assert_eq!(rx.recv().await.as_deref(), Some("quit"));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_language_toggle() {
        let board = RateBoard::new(table());
        let source = source();
        let store = MemoryHistoryStore::new();
        let mut session = Session::new(test_set(), &board, &source, &store, Vec::new());

        assert_eq!(parse_command("lang", &test_set()).unwrap(), Command::ToggleLanguage);
        assert!(session.handle_line("lang").await.unwrap());
        assert!(session.handle_line("history").await.unwrap());
        let out = String::from_utf8(std::mem::take(&mut session.out)).unwrap();
        assert!(out.contains("ပေါက်ဈေး 132 (အော်တိုဈေးနှုန်း)"));
        assert!(out.contains("မှတ်တမ်း မရှိသေးပါ။"));

        session.handle_line("lang").await.unwrap();
        let out = String::from_utf8(std::mem::take(&mut session.out)).unwrap();
        assert!(out.contains("Rate 132 (auto)"));

        let session = Session::new(test_set(), &board, &source, &store, Vec::new())
            .with_language(Language::Mm);
        assert_eq!(session.labels.history, "မှတ်တမ်း");
    }
}
