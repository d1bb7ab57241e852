use crate::service::{Label, MessageStats, Verdict};

pub enum Outcome {
    /// Submitted text was blank; nothing was classified.
    Warning,
    Verdict(Verdict),
    Error(String),
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn result_section(outcome: &Outcome, stats: &MessageStats) -> String {
    match outcome {
        Outcome::Warning => {
            r#"<div class="warning" role="alert">Please enter a message.</div>"#.to_string()
        }
        Outcome::Error(message) => format!(
            r#"<div class="result failed" role="alert">Classification failed<div class="detail">{}</div></div>"#,
            escape_html(message)
        ),
        Outcome::Verdict(verdict) => {
            let class = match verdict.label {
                Label::Spam => "spam",
                Label::Ham => "ham",
            };
            format!(
                r#"<div class="result {class}">
                {headline}
                <div class="bar"><div class="fill" style="width:{width:.1}%"></div></div>
                Confidence: {confidence:.1}%
            </div>
            <h3>Details</h3>
            <div class="details">
                <div class="info">Spam Score: {score:.4}</div>
                <div class="info">Message Length: {length} characters</div>
            </div>"#,
                class = class,
                headline = verdict.label.headline(),
                width = verdict.confidence,
                confidence = verdict.confidence,
                score = verdict.raw_score,
                length = stats.length,
            )
        }
    }
}

pub fn render(message: &str, outcome: Option<&Outcome>) -> String {
    let stats = MessageStats::of(message);
    let result = outcome
        .map(|o| result_section(o, &stats))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SMS Spam Detection</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', system-ui, sans-serif;
            background: linear-gradient(135deg, #667eea, #764ba2); min-height: 100vh; margin: 0;
        }}
        .main-card {{
            background: white; border-radius: 16px; padding: 40px; max-width: 900px;
            margin: 40px auto; box-shadow: 0 15px 40px rgba(0,0,0,0.15);
        }}
        .title {{ text-align: center; font-size: 2.6rem; font-weight: 700; color: #5a4fcf; }}
        .subtitle {{ text-align: center; color: #666; margin-bottom: 30px; }}
        .input-row {{ display: flex; gap: 24px; }}
        textarea {{ flex: 3; height: 120px; font-size: 1rem; padding: 10px; border-radius: 10px; }}
        .stats {{ flex: 1; }}
        .metric {{ font-size: 1.6rem; font-weight: 600; }}
        button {{ display: block; margin: 24px auto 0; font-size: 1.1rem; padding: 0.6rem 2rem; border-radius: 10px; }}
        .result {{ padding: 25px; border-radius: 12px; text-align: center; font-size: 1.3rem; font-weight: 600; margin-top: 20px; color: white; }}
        .spam {{ background: linear-gradient(135deg, #ff6b6b, #ee5a6f); }}
        .ham {{ background: linear-gradient(135deg, #51cf66, #37b24d); }}
        .failed {{ background: #868e96; }}
        .detail {{ font-size: 0.9rem; font-weight: 400; margin-top: 8px; }}
        .bar {{ margin-top: 15px; height: 8px; background: rgba(255,255,255,0.3); border-radius: 4px; overflow: hidden; }}
        .fill {{ height: 100%; background: white; }}
        .warning {{ margin-top: 20px; padding: 16px; border-radius: 10px; background: #fff3cd; color: #856404; }}
        .details {{ display: flex; gap: 16px; }}
        .info {{ flex: 1; padding: 12px; border-radius: 10px; background: #e7f5ff; color: #1c7ed6; }}
        .footer {{ text-align: center; color: #eee; margin-top: 30px; font-size: 0.9rem; }}
    </style>
</head>
<body>
    <div class="main-card">
        <div class="title">SMS Spam Detection</div>
        <div class="subtitle">AI-powered spam classification</div>
        <form method="post" action="/">
            <div class="input-row">
                <textarea name="message" placeholder="Type or paste the message...">{message}</textarea>
                <div class="stats">
                    <h3>Stats</h3>
                    <div>Characters</div><div class="metric">{characters}</div>
                    <div>Words</div><div class="metric">{words}</div>
                </div>
            </div>
            <button type="submit">Analyze Message</button>
        </form>
        {result}
    </div>
    <div class="footer">Powered by spamcheck</div>
</body>
</html>"#,
        message = escape_html(message),
        characters = stats.characters,
        words = stats.words,
        result = result,
    )
}
