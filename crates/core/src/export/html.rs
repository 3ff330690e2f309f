use std::{collections::HashMap, fmt::Write};

use super::{ExportDocument, ExportEntry};

/// Width of the exported card in CSS pixels.
pub const DOCUMENT_WIDTH: u32 = 800;

const BACKGROUND: &str = "#1e1b4b";

/// Render the ranking as a standalone HTML page.
///
/// `covers` maps game ids to the image source to use; games without one get
/// a placeholder tile.
pub fn render_html(doc: &ExportDocument, covers: &HashMap<String, String>) -> String {
    let mut html = String::with_capacity(8 * 1024 + doc.entries.len() * 2048);
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ margin: 0; background: {BACKGROUND}; }}
  .card {{ width: {DOCUMENT_WIDTH}px; box-sizing: border-box; padding: 40px; color: white;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: linear-gradient(135deg, #1e1b4b 0%, #312e81 50%, #1e1b4b 100%); border-radius: 20px; }}
  .entry {{ display: flex; align-items: center; gap: 12px; border-radius: 12px; }}
  .cover {{ border-radius: 8px; overflow: hidden; flex-shrink: 0; background: rgba(0,0,0,0.3);
    position: relative; display: flex; align-items: center; justify-content: center; font-size: 32px; }}
  .cover img {{ width: 100%; height: 100%; object-fit: cover; }}
  .trophy {{ position: absolute; top: 2px; right: 2px; background: #fbbf24; color: #000;
    border-radius: 50%; width: 20px; height: 20px; font-size: 12px; text-align: center; }}
  .meta {{ font-size: 12px; color: #d1d5db; }}
  .stats {{ margin-top: 30px; padding: 25px; background: rgba(0,0,0,0.3); border-radius: 15px;
    display: grid; gap: 20px; text-align: center; }}
  .value {{ font-size: 32px; font-weight: bold; color: #fbbf24; }}
</style>
</head>
<body>
<div class="card">
  <div style="text-align: center; margin-bottom: 40px;">
    <div style="font-size: 48px; margin-bottom: 10px;">🎮</div>
    <h1 style="font-size: 36px; margin: 0 0 10px 0; line-height: 1.2;">{title}</h1>
    <p style="font-size: 18px; color: #a78bfa; margin: 0;">Já Joguei - {year}</p>
  </div>
  <div style="background: rgba(0,0,0,0.3); border-radius: 15px; padding: 30px;">
"#,
        title = escape(&doc.title),
        year = doc.year,
    );

    let last = doc.entries.len().saturating_sub(1);
    for (index, entry) in doc.entries.iter().enumerate() {
        render_entry(
            &mut html,
            entry,
            covers.get(&entry.game.id).map(String::as_str),
            index == last,
        );
    }
    if doc.entries.is_empty() {
        html.push_str("    <p style=\"text-align: center; color: #9ca3af;\">Nenhum jogo encontrado</p>\n");
    }
    html.push_str("  </div>\n");

    render_summary(&mut html, doc);

    html.push_str(
        r#"  <div style="margin-top: 20px; text-align: center; font-size: 12px; color: #9ca3af;">Criado com Já Joguei 🎮</div>
</div>
</body>
</html>
"#,
    );
    html
}

fn render_entry(html: &mut String, entry: &ExportEntry, cover: Option<&str>, is_last: bool) {
    let game = &entry.game;
    let podium = entry.is_podium();
    let (padding, spacing, tile, name_size, star_size, badge_size) = if podium {
        ("16px", "16px", 80, "20px", "24px", "28px")
    } else {
        ("12px", "8px", 60, "16px", "18px", "20px")
    };
    let margin = if is_last { "0" } else { spacing };
    let background = if podium {
        "rgba(167, 139, 250, 0.2)"
    } else {
        "rgba(255,255,255,0.05)"
    };
    let accent = match entry.position {
        1 => "#fbbf24",
        2 => "#c0c0c0",
        3 => "#cd7f32",
        _ => "#a78bfa",
    };

    let cover_html = match cover {
        Some(src) => {
            let trophy = if game.platinado {
                r#"<div class="trophy">🏆</div>"#
            } else {
                ""
            };
            format!(
                r#"<img src="{}" alt="{}">{trophy}"#,
                escape(src),
                escape(&game.name)
            )
        }
        None => "🎮".to_string(),
    };

    let mut meta = format!("<span>{}</span>", escape(game.platform.label()));
    if game.platinado {
        meta.push_str(r#" <span style="color: #fbbf24;">• 🏆 Platinado</span>"#);
    }
    if !game.tags.is_empty() {
        let tags: Vec<String> = game.tags.iter().take(2).map(|tag| escape(tag)).collect();
        let _ = write!(meta, " <span>• {}</span>", tags.join(", "));
    }

    let _ = write!(
        html,
        r#"    <div class="entry" style="padding: {padding}; margin-bottom: {margin}; background: {background}; border-left: 4px solid {accent};">
      <div style="font-size: {badge_size}; font-weight: bold; min-width: 40px; text-align: center; flex-shrink: 0;">{badge}</div>
      <div class="cover" style="width: {tile}px; height: {tile}px;">{cover_html}</div>
      <div style="flex: 1; min-width: 0;">
        <div style="font-size: {name_size}; font-weight: bold; margin-bottom: 4px; line-height: 1.3;">{name}</div>
        <div class="meta">{meta}</div>
      </div>
      <div style="text-align: right; flex-shrink: 0; min-width: 60px;">
        <div style="font-size: {star_size}; font-weight: bold; color: #fbbf24;">{stars}</div>
        <div class="meta">{rating}/5</div>
      </div>
    </div>
"#,
        badge = entry.badge,
        name = escape(&game.name),
        stars = "⭐".repeat(usize::from(game.rating)),
        rating = game.rating,
    );
}

fn render_summary(html: &mut String, doc: &ExportDocument) {
    let summary = &doc.summary;
    let mut cells = vec![
        (format!("{:.1}/5", summary.avg_rating), "Nota Média", "#fbbf24"),
        (summary.platinados.to_string(), "🏆 Platinados", "#fbbf24"),
        (summary.count.to_string(), "Jogos", "#34d399"),
    ];
    if let Some(hours) = summary.total_hours {
        cells.push((format!("{hours}h"), "Horas Jogadas", "#60a5fa"));
    }

    let _ = writeln!(
        html,
        r#"  <div class="stats" style="grid-template-columns: repeat({}, 1fr);">"#,
        cells.len()
    );
    for (value, label, color) in cells {
        let _ = writeln!(
            html,
            r#"    <div><div class="value" style="color: {color};">{value}</div><div class="meta" style="font-size: 14px;">{label}</div></div>"#
        );
    }
    html.push_str("  </div>\n");
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
