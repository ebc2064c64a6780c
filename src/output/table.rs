use unicode_width::UnicodeWidthStr;

use crate::models::{Author, ChatAnswer, ContentItem, LlmCallPage, TaskAck};
use crate::status::{AsrStatus, ContentQuality, ItemStatus, StatusCounts, SummaryStatus, Vocabulary};
use crate::summary::{Block, CanonicalSummary, CaseStudy, SectionBody, SummaryBody};
use crate::view::{AuthorPage, ItemPage, Part, RenderedReport};

/// Format duration in seconds to human-readable string.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h}h{m:02}m")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Truncate a string to fit within max_width (respecting unicode width).
pub fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Pad to `width` display columns; `format!` padding counts chars, not columns.
fn pad(s: &str, width: usize) -> String {
    let cut = truncate(s, width);
    let used = UnicodeWidthStr::width(cut.as_str());
    format!("{cut}{}", " ".repeat(width.saturating_sub(used)))
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn date_short(date: Option<&str>) -> &str {
    let date = date.unwrap_or("-");
    date.get(..10).unwrap_or(date)
}

/// Format the author list.
pub fn print_author_list(authors: &[Author]) {
    if authors.is_empty() {
        println!("No authors found.");
        return;
    }

    println!("{} author{}:\n", authors.len(), plural(authors.len()));
    println!("  {} {:<12} {:<12} {:<8}", pad("NAME", 32), "PLATFORM", "TYPE", "ITEMS");
    println!("  {}", "-".repeat(68));

    for a in authors {
        let items = a
            .status
            .as_ref()
            .map(|s| s.total.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {:<12} {:<12} {:<8}",
            pad(&a.name, 32),
            truncate(&a.platform, 12),
            truncate(a.author_type.as_deref().unwrap_or("-"), 12),
            items,
        );
        println!("  id: {}\n", a.id);
    }
}

/// Print the status rollup as one line per vocabulary.
pub fn print_status_counts(counts: &StatusCounts) {
    fn line<V: Vocabulary>(count: impl Fn(V) -> usize) -> String {
        V::VALUES
            .iter()
            .map(|(name, v)| format!("{name} {}", count(*v)))
            .collect::<Vec<_>>()
            .join(" · ")
    }

    println!("  Items:    {}", counts.total);
    println!("  ASR:      {}", line::<AsrStatus>(|v| counts.asr(v)));
    println!("  Summary:  {}", line::<SummaryStatus>(|v| counts.summary(v)));
    println!("  Quality:  {}", line::<ContentQuality>(|v| counts.quality(v)));
}

fn status_tags(status: &ItemStatus) -> String {
    format!(
        "asr:{} summary:{} quality:{}",
        status.asr, status.summary, status.quality
    )
}

/// Format an author's item catalog.
pub fn print_item_list(items: &[ContentItem]) {
    if items.is_empty() {
        println!("No videos found.");
        return;
    }

    println!("{} video{}:\n", items.len(), plural(items.len()));
    println!("  {} {:<12} {:<8} {:<12}", pad("TITLE", 42), "DATE", "DURATION", "TYPE");
    println!("  {}", "-".repeat(76));

    for item in items {
        println!(
            "  {} {:<12} {:<8} {:<12}",
            pad(&item.title, 42),
            date_short(item.published_at.as_deref()),
            item.duration.map(format_duration).unwrap_or_else(|| "-".to_string()),
            truncate(item.content_type.as_deref().unwrap_or("-"), 12),
        );
        println!("  {}", status_tags(&ItemStatus::of(item)));
        println!("  id: {}\n", item.id);
    }
}

fn print_block(block: &Block) {
    let prefix = match block.kind.as_str() {
        "heading" | "h1" | "h2" | "h3" | "title" => "## ",
        "bullet" | "list_item" | "bullet_list" => "- ",
        "quote" | "callout" => "> ",
        _ => "",
    };
    for (i, line) in block.text.lines().enumerate() {
        if i == 0 {
            println!("  {prefix}{line}");
        } else {
            println!("  {}{line}", " ".repeat(prefix.len()));
        }
    }
}

fn print_indented(text: &str, indent: &str) {
    for line in text.lines() {
        println!("{indent}{line}");
    }
}

/// Render a canonical summary body. Every body kind has a rendering.
pub fn print_summary(summary: &CanonicalSummary) {
    if let Some(category) = &summary.category {
        println!("  Category: {category}");
    }

    match &summary.body {
        SummaryBody::Blocks(blocks) => {
            for block in blocks {
                print_block(block);
            }
        }
        SummaryBody::Tagged(sections) => {
            for s in sections {
                println!("  [{}]", s.tag);
                print_indented(s.text.trim(), "    ");
            }
        }
        SummaryBody::Sections(sections) => {
            for s in sections {
                println!("  {}:", s.label);
                match &s.body {
                    SectionBody::Text(text) => print_indented(text, "    "),
                    SectionBody::List(items) => {
                        for item in items {
                            println!("    - {item}");
                        }
                    }
                    SectionBody::Cases(cases) => {
                        for case in cases {
                            match case {
                                CaseStudy::Description(text) => println!("    - {text}"),
                                CaseStudy::Labeled(parts) => {
                                    for (i, (label, text)) in parts.iter().enumerate() {
                                        let bullet = if i == 0 { "-" } else { " " };
                                        println!("    {bullet} {label}: {text}");
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        SummaryBody::Markdown(md) | SummaryBody::Raw(md) => print_indented(md, "  "),
        SummaryBody::Short(short) => {
            if let Some(text) = &short.summary {
                print_indented(text, "  ");
            }
        }
        SummaryBody::Empty => println!("  No summary available."),
    }

    if let Some(short) = &summary.short {
        if !short.keywords.is_empty() {
            println!("  Keywords: {}", truncate(&short.keywords.join(", "), 72));
        }
    }
}

fn print_report(r: &RenderedReport) {
    println!(
        "  {} ({})",
        r.report.type_key(),
        date_short(r.report.created_at.as_deref())
    );
    print_summary(&r.rendered);
}

/// Format the author screen. Failed parts print their error in place.
pub fn print_author_page(page: &AuthorPage) {
    match &page.detail {
        Part::Loaded(d) => {
            println!("Author: {}", d.author.name);
            println!("  ID:       {}", d.author.id);
            println!("  Platform: {}", d.author.platform);
            println!("  Type:     {}", d.author.author_type.as_deref().unwrap_or("-"));
            if let Some(url) = &d.author.homepage_url {
                println!("  Homepage: {url}");
            }
        }
        Part::Failed { error } => {
            println!("Author: {}", page.author_id);
            println!("  Error loading author: {error}");
        }
    }

    if let Some(counts) = &page.status {
        println!("\nStatus:");
        print_status_counts(counts);
    }

    if page.detail.loaded().is_some() {
        println!("\nLatest report:");
        match &page.latest_report {
            Some(r) => print_report(r),
            None => println!("  No report yet."),
        }

        if page.reports_by_type.len() > 1 {
            println!("\nReports by type:");
            for (kind, reports) in &page.reports_by_type {
                println!("  {kind}: {} report{}", reports.len(), plural(reports.len()));
            }
        }
    }

    println!();
    match &page.items {
        Part::Loaded(items) => print_item_list(items),
        Part::Failed { error } => println!("Error loading videos: {error}"),
    }
}

/// Format the item screen.
pub fn print_item_page(page: &ItemPage) {
    let item = &page.item;
    println!("Video: {}", item.title);
    println!("  ID:       {}", item.id);
    if let Some(date) = &item.published_at {
        println!("  Date:     {date}");
    }
    if let Some(d) = item.duration {
        println!("  Duration: {}", format_duration(d));
    }
    println!("  Type:     {}", item.content_type.as_deref().unwrap_or("-"));
    println!("  Status:   {}", status_tags(&page.status));
    if let Some(url) = &item.url {
        println!("  Source:   {url}");
    }
    if let Some(link) = &page.playback {
        println!("  Playback: {}", link.url);
        println!("            expires {}", link.expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    println!("\nSummary:");
    print_summary(&page.summary);

    if !page.transcript.is_empty() {
        println!("\nTranscript ({} segment{}):", page.transcript.len(), plural(page.transcript.len()));
        for line in &page.transcript {
            println!("  {line}");
        }
    }
}

/// "showing X-Y of TOTAL" for a page starting at `offset`.
pub fn page_range(offset: usize, shown: usize, total: usize) -> String {
    if shown == 0 {
        return format!("showing 0 of {total}");
    }
    format!("showing {}-{} of {total}", offset + 1, offset + shown)
}

/// Format a page of the LLM call log.
pub fn print_llm_calls(page: &LlmCallPage, offset: usize) {
    println!("LLM calls, {}:\n", page_range(offset, page.items.len(), page.total));
    if page.items.is_empty() {
        return;
    }

    println!(
        "  {:<20} {:<22} {:<24} {:<8} {:>8}",
        "TIME", "TASK", "MODEL", "STATUS", "LATENCY"
    );
    println!("  {}", "-".repeat(86));

    for call in &page.items {
        let time = call.created_at.as_deref().unwrap_or("-");
        println!(
            "  {:<20} {:<22} {:<24} {:<8} {:>8}",
            truncate(time.get(..19).unwrap_or(time), 20),
            truncate(call.task_type.as_deref().unwrap_or("-"), 22),
            truncate(call.model.as_deref().unwrap_or("-"), 24),
            truncate(call.status.as_deref().unwrap_or("-"), 8),
            call.latency_ms
                .map(|ms| format!("{ms}ms"))
                .unwrap_or_else(|| "-".to_string()),
        );
        if let Some(err) = call.error.as_deref().filter(|e| !e.is_empty()) {
            println!("  └─ {}", truncate(&err.replace('\n', " "), 80));
        }
    }
}

/// Acknowledgement of an enqueued job.
pub fn print_ack(what: &str, ack: &TaskAck) {
    let mut line = format!("Queued: {what}");
    if let Some(id) = &ack.task_id {
        line.push_str(&format!(" (task {id})"));
    }
    println!("{line}");
    if let Some(msg) = ack.message.as_deref().filter(|m| !m.is_empty()) {
        println!("  {msg}");
    }
    println!("  Results appear on the next refresh.");
}

pub fn print_chat(answer: &ChatAnswer) {
    println!("{}", answer.answer.trim());
    if !answer.citations.is_empty() {
        println!("\nSources:");
        for c in &answer.citations {
            let label = c
                .get("title")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| c.to_string());
            println!("  - {}", truncate(&label, 76));
        }
    }
}
