//! Interactive numbered menu on top of [`Tdl`].
//!
//! Every action ends back at the menu; failures are printed, never returned.
//! Input and output are generic so the menu can be scripted.

use std::io::{self, Write};

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Error;
use crate::locator::{Locator, MessageSelector};
use crate::tdl::{DownloadResult, ProcessRunner, Tdl};

const RULE_WIDTH: usize = 80;
const DEFAULT_RANGE_START: &str = "1";
const DEFAULT_RANGE_END: &str = "50";

const FAILURE_TIPS: &[&str] = &[
    "make sure the chat id is correct",
    "make sure the message id exists",
    "for bots, the chat id is usually a number",
    "try a different message range, e.g. if a bot sent files in messages 1-20 try '1-20'",
];

pub struct Menu<'a, R, I, O> {
    tdl: &'a Tdl<R>,
    input: I,
    output: O,
}

impl<'a, R, I, O> Menu<'a, R, I, O>
where
    R: ProcessRunner,
    I: AsyncBufRead + Unpin,
    O: Write,
{
    pub fn new(tdl: &'a Tdl<R>, input: I, output: O) -> Self {
        Self { tdl, input, output }
    }

    pub fn into_output(self) -> O {
        self.output
    }

    /// Loops until the user picks exit or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.show_menu()?;
            let Some(choice) = self.prompt("Choose option (1-5): ").await? else {
                return Ok(());
            };

            let keep_going = match choice.as_str() {
                "1" => self.download_by_link().await?,
                "2" => self.search_guidance().await?,
                "3" => self.download_by_message_id().await?,
                "4" => self.list_chats().await?,
                "5" => {
                    writeln!(self.output, "\nGoodbye!")?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.output, "{}", "Invalid choice!".red())?;
                    true
                }
            };
            if !keep_going {
                return Ok(());
            }

            if self.prompt("\nPress Enter to continue...").await?.is_none() {
                return Ok(());
            }
        }
    }

    fn show_menu(&mut self) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output, "\n{rule}")?;
        writeln!(self.output, "{}", "TELEGRAM FAST DOWNLOADER".bold())?;
        writeln!(self.output, "{rule}\n")?;
        writeln!(self.output, "1. Download from channel/group (message link)")?;
        writeln!(self.output, "2. Search & download by filename (guided)")?;
        writeln!(self.output, "3. Download by message id")?;
        writeln!(self.output, "4. List your chats (to find chat ids)")?;
        writeln!(self.output, "5. Exit\n")?;
        Ok(())
    }

    /// Reads one trimmed line. `None` means input is exhausted.
    async fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn download_by_link(&mut self) -> io::Result<bool> {
        self.heading("DOWNLOAD FROM MESSAGE LINK")?;
        writeln!(
            self.output,
            "Open Telegram, right-click the message, choose 'Copy Message Link' and paste it below.\n"
        )?;
        let Some(link) = self.prompt("Telegram message link: ").await? else {
            return Ok(false);
        };
        if link.is_empty() {
            writeln!(self.output, "{}", "No link provided!".red())?;
            return Ok(true);
        }
        self.download(Locator::url(link), None).await?;
        Ok(true)
    }

    async fn search_guidance(&mut self) -> io::Result<bool> {
        self.heading("SEARCH & DOWNLOAD BY FILENAME")?;
        let Some(chat_id) = self.prompt("Chat id (from option 4): ").await? else {
            return Ok(false);
        };
        if chat_id.is_empty() {
            writeln!(self.output, "{}", "No chat id provided!".red())?;
            return Ok(true);
        }
        let Some(term) = self.prompt("Filename or search term: ").await? else {
            return Ok(false);
        };
        if term.is_empty() {
            writeln!(self.output, "{}", "No search term provided!".red())?;
            return Ok(true);
        }

        writeln!(
            self.output,
            "\ntdl cannot search by filename, so '{term}' has to be found by message id:"
        )?;
        writeln!(
            self.output,
            "  A) download a message range and narrow it with a file-type filter"
        )?;
        writeln!(
            self.output,
            "  B) download specific message ids you already know (e.g. 10,15,20)\n"
        )?;

        let Some(choice) = self.prompt("Choose A or B (Enter to skip): ").await? else {
            return Ok(false);
        };
        match choice.to_ascii_lowercase().as_str() {
            "a" => {
                let Some(start) = self.prompt("Start message id [1]: ").await? else {
                    return Ok(false);
                };
                let Some(end) = self.prompt("End message id [50]: ").await? else {
                    return Ok(false);
                };
                let start = if start.is_empty() { DEFAULT_RANGE_START } else { start.as_str() };
                let end = if end.is_empty() { DEFAULT_RANGE_END } else { end.as_str() };
                let selector = format!("{start}-{end}");
                let Some(filter) = self.prompt_filter().await? else {
                    return Ok(false);
                };
                self.download_message(&chat_id, &selector, filter).await?;
            }
            "b" => {
                let question = "Message id(s) (e.g. 10,15,20 or 10-20): ";
                let Some(ids) = self.prompt(question).await? else {
                    return Ok(false);
                };
                if !ids.is_empty() {
                    self.download_message(&chat_id, &ids, None).await?;
                }
            }
            _ => writeln!(self.output, "{}", "Cancelled".yellow())?,
        }
        Ok(true)
    }

    async fn download_by_message_id(&mut self) -> io::Result<bool> {
        self.heading("DOWNLOAD BY MESSAGE ID")?;
        let Some(chat_id) = self.prompt("Chat id (@username or numeric id): ").await? else {
            return Ok(false);
        };
        if chat_id.is_empty() {
            writeln!(self.output, "{}", "No chat id provided!".red())?;
            return Ok(true);
        }
        writeln!(self.output, "Single: 123   Range: 100-200   Multiple: 1,5,10,15")?;
        let Some(ids) = self.prompt("Message id(s): ").await? else {
            return Ok(false);
        };
        if ids.is_empty() {
            writeln!(self.output, "{}", "No message id provided!".red())?;
            return Ok(true);
        }
        let Some(filter) = self.prompt_filter().await? else {
            return Ok(false);
        };
        self.download_message(&chat_id, &ids, filter).await?;
        Ok(true)
    }

    async fn list_chats(&mut self) -> io::Result<bool> {
        self.heading("YOUR CHATS")?;
        match self.tdl.list_chats().await {
            Ok(chats) if chats.is_empty() => {
                writeln!(self.output, "{}", "No chats listed (are you logged in?)".yellow())?;
            }
            Ok(chats) => {
                for chat in chats {
                    writeln!(self.output, "{chat}")?;
                }
                writeln!(self.output, "\nTip: copy the chat id (first column) for option 2 or 3.")?;
            }
            Err(err) => self.report_error(&err)?,
        }
        Ok(true)
    }

    /// `Some(None)` is "no filter", `None` is end of input.
    async fn prompt_filter(&mut self) -> io::Result<Option<Option<Vec<String>>>> {
        writeln!(self.output, "\nFilter by file type? e.g. *.mp4,*.mkv or *.pdf")?;
        let Some(filter) = self.prompt("Filter (Enter to skip): ").await? else {
            return Ok(None);
        };
        let patterns = split_patterns(&filter);
        Ok(Some((!patterns.is_empty()).then_some(patterns)))
    }

    async fn download_message(
        &mut self,
        chat_id: &str,
        ids: &str,
        filter: Option<Vec<String>>,
    ) -> io::Result<()> {
        let selector = match ids.parse::<MessageSelector>() {
            Ok(selector) => selector,
            Err(err) => return self.report_error(&err),
        };
        self.download(Locator::message(chat_id, selector), filter).await
    }

    async fn download(&mut self, locator: Locator, filter: Option<Vec<String>>) -> io::Result<()> {
        let mut request = self.tdl.config().request(locator);
        if let Some(patterns) = filter {
            request.include = patterns;
        }

        if let Ok(link) = request.locator.resolve() {
            writeln!(self.output, "\nDownloading {link}")?;
        }
        writeln!(
            self.output,
            "{}",
            format!(
                "FAST MODE: {} threads, {} byte chunks, pool {}",
                request.threads,
                request.chunk_size,
                request.pool_size.unwrap_or_default()
            )
            .cyan()
        )?;
        if !request.include.is_empty() {
            writeln!(self.output, "Filter: {}", request.include.join(","))?;
        }

        match self.tdl.download(&request).await {
            Ok(result) => self.report_result(&result),
            Err(err) => self.report_error(&err),
        }
    }

    fn report_result(&mut self, result: &DownloadResult) -> io::Result<()> {
        if result.succeeded {
            writeln!(self.output, "\n{} {}", "Done:".green().bold(), result.message)?;
            return Ok(());
        }
        writeln!(self.output, "\n{}", "Download failed. Error:".red().bold())?;
        writeln!(self.output, "{}", result.message)?;
        writeln!(self.output, "\nTips:")?;
        for tip in FAILURE_TIPS {
            writeln!(self.output, "  - {tip}")?;
        }
        Ok(())
    }

    fn report_error(&mut self, err: &Error) -> io::Result<()> {
        writeln!(self.output, "{} {err}", "Error:".red().bold())
    }

    fn heading(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output, "\n{}", title.bold())?;
        writeln!(self.output, "{}", "-".repeat(RULE_WIDTH))
    }
}

fn split_patterns(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
