//! Single-page app shell.
//!
//! The page is rendered once per request from the current [`ViewState`]. All
//! later interaction happens in the inline script, which talks to
//! `POST /api/analyze` and nothing else.

use serde::Serialize;

use super::view_state::{Step, Tab, ViewState};
use crate::domain::{PDF_MIME_TYPE, UPLOAD_FIELD};
use crate::error::{AppError, format_limit};

/// Values the browser script needs to validate like the server does.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientConfig<'a> {
    analyze_url: &'a str,
    field_name: &'a str,
    mime_type: &'a str,
    max_bytes: usize,
    messages: ClientMessages,
    state: &'a ViewState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientMessages {
    unsupported_type: String,
    too_large: String,
    network: &'static str,
}

/// Render the shell for a fresh visit, validating against `upload_limit`.
pub fn render_index(upload_limit: usize) -> String {
    render(&ViewState::with_upload_limit(upload_limit))
}

/// Render the shell for the given state.
pub fn render(state: &ViewState) -> String {
    let config = ClientConfig {
        analyze_url: "/api/analyze",
        field_name: UPLOAD_FIELD,
        mime_type: PDF_MIME_TYPE,
        max_bytes: state.upload_limit,
        messages: ClientMessages {
            unsupported_type: AppError::UnsupportedMediaType {
                content_type: String::new(),
            }
            .user_message(),
            too_large: AppError::PayloadTooLarge {
                limit_bytes: state.upload_limit,
            }
            .user_message(),
            network: "Upload failed. Please try again.",
        },
        state,
    };
    // `</` must not appear inside an inline <script> element.
    let config_json = serde_json::to_string(&config)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    let tabs = tab_bar(state.tab);
    let max_size = format_limit(state.upload_limit);
    let upload_hidden = hidden_unless(state.step != Step::Results);
    let results_hidden = hidden_unless(state.step == Step::Results);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="AI powered health advisor for blood marker reports">
    <title>AI Health Advisor</title>
    <style>{STYLE}</style>
</head>
<body>
    <header class="site-header">
        <h1>AI powered Health Advisor</h1>
        <p>Your personal health insights from blood marker reports</p>
    </header>

    <main id="app">
        <section id="upload-view" class="card"{upload_hidden}>
            <h2>Upload Your Medical Report</h2>
            <p>Drag &amp; drop your PDF file here, or click to select a file (max {max_size}).</p>
            <label id="dropzone" class="dropzone" for="file-input">
                <input id="file-input" type="file" accept="{PDF_MIME_TYPE},.pdf" hidden>
                <strong id="dropzone-title">Drag &amp; drop or click to select</strong>
                <span>PDF only. Your data is never stored.</span>
            </label>
            <div id="file-preview" class="file-preview" hidden>
                <div>
                    <h4 id="file-name"></h4>
                    <p id="file-size"></p>
                </div>
                <button id="remove-file" type="button" title="Remove file">&times;</button>
            </div>
            <div id="progress" class="progress" hidden>
                <div class="progress-bar"><div id="progress-fill" class="progress-fill"></div></div>
                <span id="progress-label">0%</span>
            </div>
            <div id="upload-error" class="error" hidden></div>
            <button id="analyze" class="primary" type="button" disabled>Analyze My Blood Report</button>
        </section>

        <section id="results-view" class="card"{results_hidden}>
            <div class="result-header">
                <div>
                    <h2>Analysis Results</h2>
                    <p id="result-meta"></p>
                </div>
                <div class="actions">
                    <button id="bookmark" type="button" aria-pressed="false">Bookmark</button>
                    <button id="reminder" type="button" aria-pressed="false">Remind me</button>
                    <button id="share" type="button">Share</button>
                    <button id="export-text" type="button">Download .txt</button>
                    <button id="export-print" type="button">Print</button>
                    <button id="new-analysis" class="primary" type="button">New Analysis</button>
                </div>
            </div>
            <nav class="tabs" role="tablist">{tabs}</nav>
            <article id="tab-panel" class="markdown" role="tabpanel"></article>
        </section>
    </main>

    <footer class="disclaimer">
        <strong>Important Note:</strong> This analysis is for informational purposes only and should
        not replace professional medical advice. Please consult with your healthcare provider for
        proper medical guidance.
    </footer>

    <div id="toasts" class="toasts" aria-live="polite"></div>

    <script id="advisor-config" type="application/json">{config_json}</script>
    <script>{SCRIPT}</script>
</body>
</html>"#
    )
}

fn hidden_unless(visible: bool) -> &'static str {
    if visible { "" } else { " hidden" }
}

fn tab_bar(active: Tab) -> String {
    Tab::ALL
        .iter()
        .map(|tab| {
            format!(
                r#"<button type="button" role="tab" class="tab" data-tab="{id}" aria-selected="{selected}">{label}</button>"#,
                id = tab.id(),
                selected = *tab == active,
                label = tab.label(),
            )
        })
        .collect()
}

const STYLE: &str = r"
:root { --primary: #2563eb; --danger: #dc2626; --muted: #64748b; --surface: #ffffff; --bg: #f1f5f9; }
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, -apple-system, 'Segoe UI', sans-serif; background: var(--bg); color: #0f172a; }
.site-header { text-align: center; padding: 2rem 1rem 1rem; }
.site-header h1 { margin: 0; color: var(--primary); }
.site-header p { margin: .5rem 0 0; color: var(--muted); }
main { max-width: 880px; margin: 0 auto; padding: 1rem; }
.card { background: var(--surface); border-radius: 1rem; padding: 1.5rem; box-shadow: 0 4px 16px rgba(15,23,42,.08); }
.dropzone { display: flex; flex-direction: column; align-items: center; gap: .5rem; padding: 2.5rem 1rem; border: 2px dashed #cbd5e1; border-radius: .75rem; cursor: pointer; text-align: center; }
.dropzone.drag-active { border-color: var(--primary); background: #eff6ff; }
.file-preview { display: flex; justify-content: space-between; align-items: center; margin-top: 1rem; padding: .75rem 1rem; background: #f8fafc; border-radius: .5rem; }
.file-preview h4, .file-preview p { margin: 0; }
.progress { display: flex; align-items: center; gap: .75rem; margin-top: 1rem; }
.progress-bar { flex: 1; height: .5rem; background: #e2e8f0; border-radius: 999px; overflow: hidden; }
.progress-fill { height: 100%; width: 0; background: var(--primary); transition: width .2s ease; }
.error { margin-top: 1rem; padding: .75rem 1rem; border-radius: .5rem; background: #fef2f2; color: var(--danger); }
button { font: inherit; padding: .5rem .9rem; border-radius: .5rem; border: 1px solid #cbd5e1; background: #fff; cursor: pointer; }
button[aria-pressed='true'] { background: #eff6ff; border-color: var(--primary); }
button.primary { background: var(--primary); border-color: var(--primary); color: #fff; }
button:disabled { opacity: .5; cursor: not-allowed; }
#analyze { margin-top: 1.25rem; width: 100%; }
.result-header { display: flex; flex-wrap: wrap; justify-content: space-between; gap: 1rem; }
.result-header h2 { margin: 0; }
.result-header p { margin: .25rem 0 0; color: var(--muted); }
.actions { display: flex; flex-wrap: wrap; gap: .5rem; align-items: flex-start; }
.tabs { display: flex; gap: .25rem; margin: 1.25rem 0 1rem; border-bottom: 1px solid #e2e8f0; }
.tab { border: none; border-bottom: 2px solid transparent; border-radius: 0; }
.tab[aria-selected='true'] { border-bottom-color: var(--primary); color: var(--primary); }
.markdown h1, .markdown h2, .markdown h3 { color: #1e293b; }
.markdown li { margin: .25rem 0; }
.disclaimer { max-width: 880px; margin: 1.5rem auto 2rem; padding: 1rem; font-size: .875rem; color: #92400e; background: #fef3c7; border-radius: .5rem; }
.toasts { position: fixed; right: 1rem; bottom: 1rem; display: flex; flex-direction: column; gap: .5rem; }
.toast { padding: .75rem 1rem; border-radius: .5rem; color: #fff; background: #0f172a; box-shadow: 0 4px 12px rgba(0,0,0,.2); }
.toast.error { background: var(--danger); margin: 0; }
@media print { .site-header, .actions, .tabs, .toasts, #upload-view { display: none !important; } .card { box-shadow: none; } }
";

const SCRIPT: &str = r#"
(() => {
  const cfg = JSON.parse(document.getElementById('advisor-config').textContent);
  const $ = (id) => document.getElementById(id);
  let state = cfg.state;
  let selected = null;

  const escapeHtml = (s) => s.replace(/[&<>"']/g, (c) => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;',"'":'&#39;'}[c]));
  const inline = (s) => escapeHtml(s).replace(/\*\*(.+?)\*\*/g, '<strong>$1</strong>');

  function renderMarkdown(md) {
    const out = [];
    let list = null;
    const closeList = () => { if (list) { out.push('</' + list + '>'); list = null; } };
    for (const raw of md.split('\n')) {
      const line = raw.trim();
      let m;
      if (!line) { closeList(); continue; }
      if ((m = line.match(/^(#{1,4})\s+(.*)$/))) {
        closeList();
        const level = Math.min(m[1].length + 1, 4);
        out.push('<h' + level + '>' + inline(m[2]) + '</h' + level + '>');
      } else if ((m = line.match(/^[-*]\s+(.*)$/)) || (m = line.match(/^\d+[.)]\s+(.*)$/))) {
        const kind = /^\d/.test(line) ? 'ol' : 'ul';
        if (list !== kind) { closeList(); out.push('<' + kind + '>'); list = kind; }
        out.push('<li>' + inline(m[1]) + '</li>');
      } else {
        closeList();
        out.push('<p>' + inline(line) + '</p>');
      }
    }
    closeList();
    return out.join('\n');
  }

  // Split the analysis into `## Heading` sections for the secondary tabs.
  function sections(md) {
    const found = [];
    let current = null;
    for (const line of md.split('\n')) {
      const m = line.trim().match(/^#{1,4}\s+(.*)$/);
      if (m) { current = { title: m[1].replace(/\*/g, ''), lines: [line] }; found.push(current); }
      else if (current) { current.lines.push(line); }
    }
    return found;
  }

  const TAB_SECTIONS = {
    recommendations: /recommend|lifestyle/i,
    trends: /finding/i,
    insights: /summary|note/i,
  };

  function tabMarkdown(tab, md) {
    if (tab === 'analysis') return md;
    const picked = sections(md).filter((s) => TAB_SECTIONS[tab].test(s.title));
    return picked.length ? picked.map((s) => s.lines.join('\n')).join('\n\n') : '_This section was not included in the analysis._';
  }

  const formatSize = (bytes) => (bytes / 1024 / 1024).toFixed(2) + ' MB';

  function toast(message, kind) {
    const el = document.createElement('div');
    el.className = 'toast' + (kind === 'error' ? ' error' : '');
    el.textContent = message;
    $('toasts').appendChild(el);
    setTimeout(() => el.remove(), 4000);
  }

  function validate(file) {
    if (file.type !== cfg.mimeType) return cfg.messages.unsupportedType;
    if (file.size > cfg.maxBytes) return cfg.messages.tooLarge;
    return null;
  }

  // Mirrors ViewState::apply.
  function apply(t) {
    const up = state.upload;
    switch (t.type) {
      case 'selectFile': {
        if (up.inFlight) return;
        const err = validate(t.file);
        if (err) { apply({ type: 'rejectFile', message: err }); return; }
        else { selected = t.file; state.upload = { file: { name: t.file.name, mimeType: t.file.type, size: t.file.size }, progress: 0, error: null, inFlight: false }; }
        break;
      }
      case 'rejectFile':
        if (!up.inFlight) { up.file = null; selected = null; up.error = t.message; }
        break;
      case 'clearFile':
        if (!up.inFlight) { selected = null; state.upload = { file: null, progress: 0, error: null, inFlight: false }; }
        break;
      case 'submitStarted':
        if (!up.file || up.inFlight) return;
        up.inFlight = true; up.progress = 0; up.error = null; state.step = 'analyzing';
        break;
      case 'progress':
        if (up.inFlight) up.progress = Math.max(up.progress, Math.min(100, t.pct));
        break;
      case 'completed':
        selected = null;
        state.upload = { file: null, progress: 0, error: null, inFlight: false };
        state.result = t.result; state.tab = 'analysis'; state.bookmarked = false; state.reminderSet = false; state.step = 'results';
        break;
      case 'failed':
        up.inFlight = false; up.progress = 0; up.error = t.message; state.step = 'upload';
        break;
      case 'selectTab':
        if (state.step === 'results') state.tab = t.tab;
        break;
      case 'toggleBookmark': state.bookmarked = !state.bookmarked; break;
      case 'toggleReminder': state.reminderSet = !state.reminderSet; break;
      case 'newAnalysis':
        selected = null;
        state = { uploadLimit: state.uploadLimit, step: 'upload', tab: 'analysis', upload: { file: null, progress: 0, error: null, inFlight: false }, bookmarked: false, reminderSet: false, result: null };
        break;
    }
    render();
  }

  function render() {
    const up = state.upload;
    const results = state.step === 'results';
    $('upload-view').hidden = results;
    $('results-view').hidden = !results;

    $('file-preview').hidden = !up.file;
    if (up.file) { $('file-name').textContent = up.file.name; $('file-size').textContent = formatSize(up.file.size); }
    $('progress').hidden = !up.inFlight;
    $('progress-fill').style.width = up.progress + '%';
    $('progress-label').textContent = up.progress + '%';
    $('upload-error').hidden = !up.error;
    $('upload-error').textContent = up.error || '';
    $('analyze').disabled = !up.file || up.inFlight;
    $('analyze').textContent = up.inFlight ? 'Analyzing...' : 'Analyze My Blood Report';

    if (results && state.result) {
      const r = state.result;
      $('result-meta').textContent = r.filename + ' · ' + formatSize(r.fileSizeBytes) + ' · ' + new Date(r.timestampUtc).toLocaleString();
      document.querySelectorAll('.tab').forEach((b) => b.setAttribute('aria-selected', String(b.dataset.tab === state.tab)));
      $('tab-panel').innerHTML = renderMarkdown(tabMarkdown(state.tab, r.analysisText));
      $('bookmark').setAttribute('aria-pressed', String(state.bookmarked));
      $('reminder').setAttribute('aria-pressed', String(state.reminderSet));
    }
  }

  function submit() {
    if (!selected) return;
    apply({ type: 'submitStarted' });
    const form = new FormData();
    form.append(cfg.fieldName, selected);
    const xhr = new XMLHttpRequest();
    xhr.open('POST', cfg.analyzeUrl);
    xhr.upload.onprogress = (e) => { if (e.lengthComputable) apply({ type: 'progress', pct: Math.round(e.loaded * 100 / e.total) }); };
    xhr.onload = () => {
      let body = null;
      try { body = JSON.parse(xhr.responseText); } catch (_) { body = null; }
      if (xhr.status >= 200 && xhr.status < 300 && body && body.success) {
        apply({ type: 'completed', result: { filename: body.filename, fileSizeBytes: body.fileSize, analysisText: body.analysis, timestampUtc: body.timestamp } });
        toast('Analysis complete!');
      } else {
        apply({ type: 'failed', message: (body && body.error) || cfg.messages.network });
        toast('Upload failed.', 'error');
      }
    };
    xhr.onerror = () => { apply({ type: 'failed', message: cfg.messages.network }); toast('Upload failed.', 'error'); };
    xhr.send(form);
  }

  function reportText(r) {
    return [
      'Health Analysis Report',
      'File: ' + r.filename,
      'Size: ' + formatSize(r.fileSizeBytes),
      'Analyzed: ' + new Date(r.timestampUtc).toLocaleString(),
      '',
      r.analysisText,
      '',
      'This AI analysis is for informational purposes only and is not a substitute for professional medical advice.',
    ].join('\n');
  }

  function exportText() {
    const r = state.result;
    const blob = new Blob([reportText(r)], { type: 'text/plain' });
    const a = document.createElement('a');
    a.href = URL.createObjectURL(blob);
    a.download = 'health-analysis-' + r.timestampUtc.slice(0, 10) + '.txt';
    document.body.appendChild(a);
    a.click();
    a.remove();
    URL.revokeObjectURL(a.href);
  }

  function exportPrint() {
    const r = state.result;
    const w = window.open('', '_blank');
    if (!w) { toast('Allow pop-ups to print the report.', 'error'); return; }
    w.document.write('<!DOCTYPE html><html><head><meta charset="utf-8"><title>Health Analysis Report</title></head>' +
      '<body style="font-family: Arial, sans-serif; max-width: 800px; margin: 2rem auto; line-height: 1.6">' +
      '<h1>Health Analysis Report</h1><p>' + escapeHtml(r.filename) + ' · ' + formatSize(r.fileSizeBytes) + ' · ' + escapeHtml(new Date(r.timestampUtc).toLocaleString()) + '</p>' +
      renderMarkdown(r.analysisText) + '</body></html>');
    w.document.close();
    w.focus();
    w.print();
  }

  const input = $('file-input');
  const zone = $('dropzone');
  input.addEventListener('change', () => { if (input.files[0]) apply({ type: 'selectFile', file: input.files[0] }); input.value = ''; });
  zone.addEventListener('dragover', (e) => { e.preventDefault(); zone.classList.add('drag-active'); });
  zone.addEventListener('dragleave', () => zone.classList.remove('drag-active'));
  zone.addEventListener('drop', (e) => {
    e.preventDefault();
    zone.classList.remove('drag-active');
    if (e.dataTransfer.files[0]) apply({ type: 'selectFile', file: e.dataTransfer.files[0] });
  });
  $('remove-file').addEventListener('click', () => apply({ type: 'clearFile' }));
  $('analyze').addEventListener('click', submit);
  document.querySelectorAll('.tab').forEach((b) => b.addEventListener('click', () => apply({ type: 'selectTab', tab: b.dataset.tab })));
  $('bookmark').addEventListener('click', () => apply({ type: 'toggleBookmark' }));
  $('reminder').addEventListener('click', () => apply({ type: 'toggleReminder' }));
  $('share').addEventListener('click', () => {
    if (navigator.clipboard) navigator.clipboard.writeText(location.href).then(() => toast('Link copied.'), () => toast('Could not copy link.', 'error'));
  });
  $('export-text').addEventListener('click', exportText);
  $('export-print').addEventListener('click', exportPrint);
  $('new-analysis').addEventListener('click', () => apply({ type: 'newAnalysis' }));

  render();
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_UPLOAD_BYTES;

    #[test]
    fn test_shell_embeds_limits_and_field() {
        let html = render_index(MAX_UPLOAD_BYTES);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#""fieldName":"bloodReport""#));
        assert!(html.contains(r#""maxBytes":10485760"#));
        assert!(html.contains("File too large. Maximum size is 10MB."));
        assert!(html.contains("(max 10MB)"));
    }

    #[test]
    fn test_shell_uses_configured_limit() {
        let html = render_index(512 * 1024);
        assert!(html.contains(r#""maxBytes":524288"#));
        assert!(html.contains("File too large. Maximum size is 512KB."));
        assert!(html.contains("(max 512KB)"));
        assert!(!html.contains("10485760"));
    }

    #[test]
    fn test_tab_bar_marks_active_tab() {
        let html = render_index(MAX_UPLOAD_BYTES);
        for tab in Tab::ALL {
            assert!(html.contains(&format!(r#"data-tab="{}""#, tab.id())));
        }
        assert!(html.contains(r#"data-tab="analysis" aria-selected="true""#));
        assert!(html.contains(r#"data-tab="trends" aria-selected="false""#));
    }

    #[test]
    fn test_results_step_hides_upload_view() {
        let state = ViewState {
            step: Step::Results,
            ..ViewState::default()
        };
        let html = render(&state);
        assert!(html.contains(r#"<section id="upload-view" class="card" hidden>"#));
        assert!(html.contains(r#"<section id="results-view" class="card">"#));
    }

    #[test]
    fn test_config_cannot_close_script_tag() {
        let mut state = ViewState::default();
        state.upload.error = Some("</script><script>alert(1)</script>".to_string());
        let html = render(&state);
        assert!(!html.contains("</script><script>alert(1)"));
    }
}
