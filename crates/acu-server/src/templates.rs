//! HTML building blocks.
//!
//! Pages are plain `format!` strings styled with Tailwind from a CDN. Every
//! value that came from a user or the database goes through [`esc`].

use acu_auth::{Flash, FlashLevel};
use axum::http::StatusCode;

use crate::access::Viewer;

/// Escape text for HTML element content and attribute values.
pub fn esc(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Base HTML layout wrapper.
pub fn layout(title: &str, viewer: Option<&Viewer>, flashes: &[Flash], content: &str) -> String {
    let nav = nav(viewer);
    let flashes = flash_list(flashes);
    let title = esc(title);
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - AcuVerify</title>
    <script src="https://cdn.tailwindcss.com"></script>
</head>
<body class="bg-gray-50 min-h-screen">
    {nav}
    <main class="max-w-6xl mx-auto p-6 space-y-6">
        {flashes}
        {content}
    </main>
</body>
</html>"##
    )
}

fn nav(viewer: Option<&Viewer>) -> String {
    let Some(viewer) = viewer else {
        return r##"<nav class="bg-indigo-700 text-white px-6 py-3"><span class="font-semibold">AcuVerify</span></nav>"##
            .to_string();
    };

    let mut links = vec![("/", "Home")];
    if viewer.can_manage() {
        links.extend([
            ("/staff/", "Staff"),
            ("/students/", "Students"),
            ("/assign-stream/", "Assign Stream"),
            ("/academics/", "Academics"),
        ]);
    }
    if viewer.staff.is_some() || viewer.student.is_some() {
        links.push(("/homework/", "Homework"));
    }
    let links_html: String = links
        .iter()
        .map(|(href, text)| format!(r#"<a href="{href}" class="hover:underline">{text}</a>"#))
        .collect();
    let name = esc(&viewer.display_name());

    format!(
        r##"<nav class="bg-indigo-700 text-white px-6 py-3 flex items-center justify-between">
        <div class="flex items-center gap-6"><span class="font-semibold">AcuVerify</span>{links_html}</div>
        <div class="flex items-center gap-4"><span>{name}</span><a href="/logout/" class="hover:underline">Log out</a></div>
    </nav>"##
    )
}

fn flash_list(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            let color = match f.level {
                FlashLevel::Success => "green",
                FlashLevel::Info => "blue",
                FlashLevel::Error => "red",
            };
            format!(
                r#"<div class="flash flash-{level} p-4 rounded-lg border border-{color}-200 bg-{color}-50 text-{color}-800">{message}</div>"#,
                level = f.level.as_str(),
                message = esc(&f.message),
            )
        })
        .collect()
}

/// Card component.
pub fn card(title: &str, content: &str) -> String {
    let title = esc(title);
    format!(
        r##"<div class="bg-white rounded-xl shadow-sm border border-gray-200 overflow-hidden">
            <div class="px-6 py-4 border-b border-gray-200">
                <h3 class="text-lg font-semibold text-gray-900">{title}</h3>
            </div>
            <div class="p-6">
                {content}
            </div>
        </div>"##
    )
}

/// Input field component. `value` is escaped here.
pub fn input(name: &str, label: &str, input_type: &str, value: &str) -> String {
    let value = esc(value);
    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>
            <input type="{input_type}" name="{name}" id="{name}" value="{value}"
                   class="w-full px-4 py-2 border border-gray-300 rounded-lg">
        </div>"##
    )
}

/// Select field component. Option labels are escaped here.
pub fn select(name: &str, label: &str, options: &[(String, String, bool)]) -> String {
    let options_html: String = options
        .iter()
        .map(|(value, text, selected)| {
            let text = esc(text);
            if *selected {
                format!(r#"<option value="{value}" selected>{text}</option>"#)
            } else {
                format!(r#"<option value="{value}">{text}</option>"#)
            }
        })
        .collect();

    format!(
        r##"<div class="space-y-1">
            <label for="{name}" class="block text-sm font-medium text-gray-700">{label}</label>
            <select name="{name}" id="{name}" class="w-full px-4 py-2 border border-gray-300 rounded-lg">
                <option value="">---------</option>
                {options_html}
            </select>
        </div>"##
    )
}

/// A group of checkboxes sharing one field name.
pub fn checkboxes(name: &str, label: &str, options: &[(i64, String, bool)]) -> String {
    let boxes: String = options
        .iter()
        .map(|(value, text, checked)| {
            let checked = if *checked { " checked" } else { "" };
            format!(
                r#"<label class="flex items-center gap-2"><input type="checkbox" name="{name}" value="{value}"{checked}> {text}</label>"#,
                text = esc(text),
            )
        })
        .collect();
    format!(
        r##"<fieldset class="space-y-1">
            <legend class="block text-sm font-medium text-gray-700">{label}</legend>
            <div class="grid grid-cols-2 md:grid-cols-3 gap-1">{boxes}</div>
        </fieldset>"##
    )
}

/// Submit button.
pub fn button(text: &str, variant: &str) -> String {
    let bg = match variant {
        "danger" => "bg-red-600 hover:bg-red-700",
        _ => "bg-indigo-600 hover:bg-indigo-700",
    };
    format!(r##"<button type="submit" class="{bg} text-white px-4 py-2 rounded-lg font-medium">{text}</button>"##)
}

/// Badge component.
pub fn badge(text: &str, color: &str) -> String {
    format!(
        r##"<span class="inline-flex items-center px-2.5 py-0.5 rounded-full text-xs font-medium bg-{color}-100 text-{color}-800">{text}</span>"##
    )
}

/// Table component. Cells are inserted as-is.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let headers_html: String = headers
        .iter()
        .map(|h| format!(r#"<th class="px-6 py-3 text-left text-xs font-medium text-gray-500 uppercase">{h}</th>"#))
        .collect();

    let rows_html: String = rows
        .iter()
        .map(|row| {
            let cells: String = row
                .iter()
                .map(|cell| format!(r#"<td class="px-6 py-4 text-sm text-gray-900">{cell}</td>"#))
                .collect();
            format!(r#"<tr>{cells}</tr>"#)
        })
        .collect();

    format!(
        r##"<div class="overflow-x-auto">
            <table class="min-w-full divide-y divide-gray-200">
                <thead class="bg-gray-50"><tr>{headers_html}</tr></thead>
                <tbody class="bg-white divide-y divide-gray-200">{rows_html}</tbody>
            </table>
        </div>"##
    )
}

/// Empty state component.
pub fn empty_state(title: &str, description: &str, action: Option<(&str, &str)>) -> String {
    let action_html = action.map_or(String::new(), |(text, href)| {
        format!(r##"<a href="{href}" class="mt-4 inline-block bg-indigo-600 text-white px-4 py-2 rounded-lg">{text}</a>"##)
    });

    format!(
        r##"<div class="text-center py-12">
            <h3 class="text-lg font-medium text-gray-900">{title}</h3>
            <p class="mt-1 text-gray-500">{description}</p>
            {action_html}
        </div>"##
    )
}

pub fn link(href: &str, text: &str) -> String {
    format!(r#"<a href="{href}" class="text-indigo-600 hover:underline">{}</a>"#, esc(text))
}

/// Standalone page for an error status.
pub fn error_page(status: StatusCode, message: &str) -> String {
    let heading = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let content = card(
        &heading,
        &format!(
            r#"<p class="text-gray-700">{}</p><p class="mt-4">{}</p>"#,
            esc(message),
            link("/", "Back to home")
        ),
    );
    layout(&heading, None, &[], &content)
}
