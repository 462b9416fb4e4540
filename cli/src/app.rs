//! The interactive loop: stdin lines in, transcript lines out, chat requests in the background.

use std::io::Write;
use std::ops::ControlFlow;
use std::sync::Arc;

use interio_chat::ChatBackend;
use interio_chat::ChatSession;
use interio_chat::IdGenerator;
use interio_chat::LocalFile;
use interio_chat::Resolution;
use interio_chat::clipboard_paste::ClipboardPayload;
use interio_chat::clipboard_paste::normalize_pasted_path;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

use crate::input::HELP_TEXT;
use crate::input::InputLine;
use crate::input::parse_line;
use crate::transcript_printer::TranscriptPrinter;

#[derive(Debug)]
pub enum AppEvent {
    /// A background chat request settled.
    ChatResolved(Resolution),
}

pub async fn run<I, B, R, W>(
    mut session: ChatSession<I>,
    backend: Arc<B>,
    mut input: R,
    out: W,
) -> anyhow::Result<()>
where
    I: IdGenerator,
    B: ChatBackend + Send + Sync + 'static,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut printer = TranscriptPrinter::new(out);
    let mut snapshots = session.store().subscribe();
    printer.print_snapshot(&snapshots.borrow_and_update())?;

    let (app_event_tx, mut app_event_rx) = unbounded_channel::<AppEvent>();
    // Partial line bytes survive a cancelled read here.
    let mut line_buf = Vec::new();
    let mut input_closed = false;
    let mut in_flight = 0usize;

    loop {
        if input_closed && in_flight == 0 {
            break;
        }

        tokio::select! {
            read = input.read_until(b'\n', &mut line_buf), if !input_closed => {
                match read {
                    Ok(0) => input_closed = true,
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!("stopped reading input: {err}");
                        input_closed = true;
                    }
                }
                if input_closed {
                    tracing::debug!("input closed with {in_flight} request(s) in flight");
                }
                if line_buf.is_empty() || (!input_closed && !line_buf.ends_with(b"\n")) {
                    continue;
                }
                let raw = std::mem::take(&mut line_buf);
                let decoded = String::from_utf8_lossy(&raw);
                let line = decoded.strip_suffix('\n').unwrap_or(&decoded);
                let outcome =
                    handle_line(&mut session, &mut printer, &backend, &app_event_tx, line).await?;
                match outcome {
                    ControlFlow::Break(()) => break,
                    ControlFlow::Continue(true) => in_flight += 1,
                    ControlFlow::Continue(false) => {}
                }
            }
            Some(event) = app_event_rx.recv() => match event {
                AppEvent::ChatResolved(resolution) => {
                    in_flight = in_flight.saturating_sub(1);
                    session.resolve(resolution);
                }
            },
            Ok(()) = snapshots.changed() => {
                let snapshot = snapshots.borrow_and_update().clone();
                printer.print_snapshot(&snapshot)?;
            }
        }
    }

    printer.print_snapshot(&session.store().snapshot())?;
    Ok(())
}

/// Apply one input line. Breaks on quit; otherwise reports whether a request was started.
async fn handle_line<I, B, W>(
    session: &mut ChatSession<I>,
    printer: &mut TranscriptPrinter<W>,
    backend: &Arc<B>,
    app_event_tx: &UnboundedSender<AppEvent>,
    line: &str,
) -> anyhow::Result<ControlFlow<(), bool>>
where
    I: IdGenerator,
    B: ChatBackend + Send + Sync + 'static,
    W: Write,
{
    match parse_line(line) {
        InputLine::Quit => return Ok(ControlFlow::Break(())),
        InputLine::Help => printer.notice(HELP_TEXT)?,
        InputLine::ShowDraft => show_draft(session, printer)?,
        InputLine::AttachImage(raw_path) => attach_image(session, printer, &raw_path).await?,
        InputLine::Paste(text) => paste(session, printer, &text).await?,
        InputLine::RemoveImage => {
            session.composer_mut().remove_image();
            printer.notice("- image removed")?;
        }
        InputLine::Continue(text) => session.composer_mut().insert_str(&text),
        InputLine::Submit(text) => {
            session.composer_mut().insert_str(&text);
            return Ok(ControlFlow::Continue(submit(session, backend, app_event_tx)));
        }
        InputLine::UnknownCommand(command) => {
            printer.notice(&format!("! unknown command {command}; try /help"))?;
        }
    }
    Ok(ControlFlow::Continue(false))
}

/// Print the unsent draft the way an auto-sized input box would show it: the last
/// `desired_rows` lines, then the staged image.
fn show_draft<I: IdGenerator, W: Write>(
    session: &ChatSession<I>,
    printer: &mut TranscriptPrinter<W>,
) -> std::io::Result<()> {
    let composer = session.composer();
    if composer.text().is_empty() && composer.pending_image().is_none() {
        return printer.notice("  (empty draft)");
    }
    let lines: Vec<&str> = composer.text().split('\n').collect();
    let visible = usize::from(composer.desired_rows());
    let hidden = lines.len().saturating_sub(visible);
    if hidden > 0 {
        printer.notice(&format!("  ({hidden} more line(s) above)"))?;
    }
    for line in &lines[hidden..] {
        printer.notice(&format!("  > {line}"))?;
    }
    if let Some(image) = composer.pending_image() {
        printer.notice(&format!("  + {}", image.name))?;
    }
    Ok(())
}

/// Start a submission and hand its dispatch to a background task. Returns whether a request was
/// started.
fn submit<I, B>(
    session: &mut ChatSession<I>,
    backend: &Arc<B>,
    app_event_tx: &UnboundedSender<AppEvent>,
) -> bool
where
    I: IdGenerator,
    B: ChatBackend + Send + Sync + 'static,
{
    let Some(pending) = session.begin_submit() else {
        return false;
    };
    let backend = Arc::clone(backend);
    let app_event_tx = app_event_tx.clone();
    tokio::spawn(async move {
        let resolution = pending.dispatch(backend.as_ref()).await;
        if app_event_tx
            .send(AppEvent::ChatResolved(resolution))
            .is_err()
        {
            tracing::debug!("app loop exited before chat request settled");
        }
    });
    true
}

async fn attach_image<I: IdGenerator, W: Write>(
    session: &mut ChatSession<I>,
    printer: &mut TranscriptPrinter<W>,
    raw_path: &str,
) -> anyhow::Result<()> {
    let Some(path) = normalize_pasted_path(raw_path) else {
        printer.notice(&format!("! not a path: {raw_path}"))?;
        return Ok(());
    };
    let file = LocalFile::new(path);
    match session.composer_mut().attach(&file, None).await {
        Ok(()) => announce_staged(session, printer)?,
        Err(err) => printer.notice(&format!("! {}", err.alert_text()))?,
    }
    Ok(())
}

/// A paste that names an image file attaches it; anything else is typed into the composer.
async fn paste<I: IdGenerator, W: Write>(
    session: &mut ChatSession<I>,
    printer: &mut TranscriptPrinter<W>,
    text: &str,
) -> anyhow::Result<()> {
    let payload = ClipboardPayload::from_pasted_text(text);
    match session.composer_mut().attach_from_clipboard(payload).await {
        Ok(true) => announce_staged(session, printer)?,
        Ok(false) => session.composer_mut().insert_str(text),
        Err(err) => printer.notice(&format!("! {}", err.alert_text()))?,
    }
    Ok(())
}

fn announce_staged<I: IdGenerator, W: Write>(
    session: &ChatSession<I>,
    printer: &mut TranscriptPrinter<W>,
) -> std::io::Result<()> {
    match session.composer().pending_image() {
        Some(image) => printer.notice(&format!("+ attached {}", image.name)),
        None => Ok(()),
    }
}
