use snaplingo::config::AppConfig;
use snaplingo::export;
use snaplingo::language::find_language;
use snaplingo::App;

#[tokio::main]
async fn main() {
    snaplingo::init_tracing();

    let config = AppConfig::from_env();
    let app = snaplingo::run(config).await;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        // Optional one-shot export of the restored history to stdout.
        Some("export-csv") => print_export(export::to_csv(&app.store.history())),
        Some("export-json") => print_export(export::to_json(
            &app.store.history(),
            snaplingo::now_millis(),
        )),
        Some("translate") => translate(&app, &args[1..]).await,
        Some(other) => {
            eprintln!("unknown command: {other} (expected export-csv, export-json or translate)");
        }
        None => {}
    }

    app.shutdown();
    app.store.wait_for_pending_writes().await;
}

fn print_export(rendered: Result<String, export::ExportError>) {
    match rendered {
        Ok(text) => print!("{text}"),
        Err(e) => eprintln!("{e}"),
    }
}

/// `translate <from> <to> <text...>`: switch the language pair, then translate.
async fn translate(app: &App, args: &[String]) {
    let Some(pipeline) = &app.pipeline else {
        eprintln!("translation unavailable: remote client not configured");
        return;
    };
    let (from, to, text) = match args {
        [from, to, text @ ..] if !text.is_empty() => (from, to, text.join(" ")),
        _ => {
            eprintln!("usage: snaplingo translate <from> <to> <text...>");
            return;
        }
    };
    let (Some(from), Some(to)) = (find_language(from), find_language(to)) else {
        eprintln!("unsupported language code");
        return;
    };

    app.store.set_from_language(from);
    app.store.set_to_language(to);
    match pipeline.translate_text(&text).await {
        Ok(result) => {
            println!("{}", result.outcome.primary);
            for alt in &result.outcome.alternatives {
                println!("  {}: {}", alt.label, alt.text);
            }
        }
        Err(e) if e.is_retryable() => eprintln!("{e} (try again)"),
        Err(e) => eprintln!("{e}"),
    }
}
