use std::io::{Cursor, Read};
use tiny_http::{Request, Response};

use ferrite_classify::{InputType, LoadedModel};

use crate::handlers::sidebar;
use crate::render::{error_card, html_escape, render_page};
use crate::state::{get_model, lock, SharedState};
use crate::util::form::{form_get, parse_form};
use crate::util::image::image_bytes_to_input;
use crate::util::multipart::{extract_boundary, first_file, parse_multipart, text_field};

// ---------------------------------------------------------------------------
// GET /inspect?id=NAME
// ---------------------------------------------------------------------------

pub fn handle_get(query: &str, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let pairs = parse_form(query);
    let id = form_get(&pairs, "id").unwrap_or("").to_owned();
    crate::routes::html_response(build_page(&id, "", &state))
}

// ---------------------------------------------------------------------------
// POST /inspect/infer
// ---------------------------------------------------------------------------

pub fn handle_infer(request: &mut Request, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let content_type = request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default();

    let body = match read_body(request) {
        Ok(b) => b,
        Err(msg) => {
            log::warn!("inference request rejected: {}", msg);
            let session = lock(&state).session.clone();
            let content = error_card("Upload rejected", &html_escape(&msg));
            return crate::routes::html_response(render_page("Inspect", &sidebar(&session), &content));
        }
    };

    let (id, input) = if content_type.starts_with("multipart/form-data") {
        let boundary = extract_boundary(&content_type).unwrap_or_default();
        let parts = parse_multipart(&body, &boundary);
        let id = text_field(&parts, "id").unwrap_or_default();
        let input = match first_file(&parts) {
            Some(bytes) => InferInput::Image(bytes.to_vec()),
            None => InferInput::Missing,
        };
        (id, input)
    } else {
        let text = String::from_utf8_lossy(&body);
        let pairs = parse_form(&text);
        let id = form_get(&pairs, "id").unwrap_or("").to_owned();
        let raw = form_get(&pairs, "inputs").unwrap_or("").to_owned();
        (id, InferInput::Numeric(raw))
    };

    let result_html = match get_model(&state, &id) {
        Ok(model) => run_inference(&model, input),
        Err(e) => load_error(&e.to_string()),
    };
    crate::routes::html_response(build_page(&id, &result_html, &state))
}

/// Largest request body accepted by the inference form.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

fn check_body_length(len: usize) -> Result<(), String> {
    if len > MAX_BODY_BYTES {
        return Err(format!("The upload is {} bytes; the limit is {} bytes.", len, MAX_BODY_BYTES));
    }
    Ok(())
}

/// Reads the whole body, refusing anything over `MAX_BODY_BYTES` whether or
/// not the client declared a length up front.
fn read_body(request: &mut Request) -> Result<Vec<u8>, String> {
    if let Some(len) = request.body_length() {
        check_body_length(len)?;
    }
    let mut body = Vec::new();
    request.as_reader()
        .take(MAX_BODY_BYTES as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| format!("Could not read the request body: {}", e))?;
    check_body_length(body.len())?;
    Ok(body)
}

enum InferInput {
    Image(Vec<u8>),
    Numeric(String),
    Missing,
}

fn run_inference(model: &LoadedModel, input: InferInput) -> String {
    let raw = match input {
        InferInput::Missing => return error_card("Inference failed", "No image file was uploaded."),
        InferInput::Image(bytes) => {
            let (channels, width, height) = image_geometry(model);
            image_bytes_to_input(&bytes, channels, width, height)
                .map_err(|e| format!("Could not decode image: {}", e))
        }
        InferInput::Numeric(text) => parse_numeric(&text),
    };
    let raw = match raw {
        Ok(v) => v,
        Err(msg) => return error_card("Inference failed", &html_escape(&msg)),
    };
    match model.predict(&raw) {
        Ok(probs) => render_probabilities(model, &probs),
        Err(e) => error_card("Inference failed", &html_escape(&e.to_string())),
    }
}

/// Channel count and side lengths an uploaded image is resized to.
fn image_geometry(model: &LoadedModel) -> (usize, u32, u32) {
    let variant = model.checkpoint.variant;
    let declared = model.network().metadata.as_ref().and_then(|m| m.input_type.clone());
    match declared {
        Some(InputType::ImageGrayscale { width, height }) => (1, width, height),
        Some(InputType::ImageRgb { width, height }) => (3, width, height),
        _ => (variant.channels(), variant.image_side(), variant.image_side()),
    }
}

fn accepts_images(model: &LoadedModel) -> bool {
    !matches!(
        model.network().metadata.as_ref().and_then(|m| m.input_type.as_ref()),
        Some(InputType::Numeric)
    )
}

fn parse_numeric(text: &str) -> Result<Vec<f64>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|_| format!("'{}' is not a number", s)))
        .collect()
}

fn render_probabilities(model: &LoadedModel, probs: &[f64]) -> String {
    let best = ferrite_classify::activation::argmax(probs);
    let rows: String = probs.iter().enumerate()
        .map(|(i, p)| {
            let pct = p * 100.0;
            let dim = if i == best { "" } else { " dim" };
            format!(
                r#"<tr><td>{label}</td><td>{pct:.2}%</td><td><div class="bar-wrap"><div class="bar-fill{dim}" style="width:{pct:.1}%"></div></div></td></tr>"#,
                label = html_escape(&model.label_for(i)),
                pct = pct,
                dim = dim,
            )
        })
        .collect();
    format!(
        r#"<div class="result-card">
<div class="prediction-hero">{label}</div>
<div class="prediction-sub">confidence {conf:.2}%</div>
<table class="prob-table"><tr><th>Class</th><th>Probability</th><th></th></tr>{rows}</table>
</div>"#,
        label = html_escape(&model.label_for(best)),
        conf = probs.get(best).copied().unwrap_or(0.0) * 100.0,
        rows = rows,
    )
}

fn load_error(message: &str) -> String {
    error_card(
        "Could not load checkpoint",
        &format!(r#"{}<br><a href="/checkpoints">Back to checkpoints</a>"#, html_escape(message)),
    )
}

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

fn build_page(id: &str, result_html: &str, state: &SharedState) -> String {
    let session = lock(state).session.clone();
    let side = sidebar(&session);

    if id.is_empty() {
        let content = error_card(
            "No checkpoint selected",
            r#"Pick one on the <a href="/checkpoints">checkpoints</a> page."#,
        );
        return render_page("Inspect", &side, &content);
    }

    let content = match get_model(state, id) {
        Ok(model) => format!(
            "{}{}{}",
            summary_card(&model),
            input_form(&model),
            result_html
        ),
        Err(e) => {
            log::warn!("inspect '{}' failed: {}", id, e);
            load_error(&e.to_string())
        }
    };
    render_page(&format!("Inspect {}", id), &side, &content)
}

fn summary_card(model: &LoadedModel) -> String {
    let ckpt = &model.checkpoint;
    let net = model.network();
    let hparams = serde_json::to_string_pretty(&ckpt.hparams)
        .unwrap_or_else(|e| format!("<unserializable: {}>", e));
    let best = ckpt.best_val_accuracy
        .map(|a| format!("{:.2}%", a * 100.0))
        .unwrap_or_else(|| "n/a".to_owned());
    let fmt_vec = |v: &[f64]| v.iter().map(|x| format!("{:.4}", x)).collect::<Vec<_>>().join(", ");

    format!(
        r#"<div class="card"><h2>{id}</h2>
<table class="summary-table">
<tr><th>Variant</th><td>{variant}</td></tr>
<tr><th>Format version</th><td>{version}</td></tr>
<tr><th>Layers</th><td>{layers}</td></tr>
<tr><th>Input size</th><td>{input}</td></tr>
<tr><th>Classes</th><td>{classes}</td></tr>
<tr><th>Epochs trained</th><td>{epochs}</td></tr>
<tr><th>Best val accuracy</th><td>{best}</td></tr>
<tr><th>Normalize mean</th><td>{mean}</td></tr>
<tr><th>Normalize std</th><td>{std}</td></tr>
</table>
<h3 class="mt">Hyperparameters</h3>
<pre>{hparams}</pre></div>"#,
        id = html_escape(&model.id),
        variant = ckpt.variant.name(),
        version = ckpt.format_version,
        layers = net.layers.len(),
        input = net.input_size(),
        classes = net.output_size(),
        epochs = ckpt.epochs_trained,
        best = best,
        mean = fmt_vec(&model.normalize.mean),
        std = fmt_vec(&model.normalize.std),
        hparams = html_escape(&hparams),
    )
}

fn input_form(model: &LoadedModel) -> String {
    let id = html_escape(&model.id);
    if accepts_images(model) {
        let (channels, width, height) = image_geometry(model);
        format!(
            r#"<div class="card"><h2>Run inference</h2>
<form method="POST" action="/inspect/infer" enctype="multipart/form-data">
  <input type="hidden" name="id" value="{id}">
  <input type="file" name="image_file" accept="image/*">
  <p class="hint">Resized to {width}x{height}, {channels} channel(s).</p>
  <div class="mt"><button type="submit" class="btn btn-primary">Predict</button></div>
</form></div>"#,
        )
    } else {
        format!(
            r#"<div class="card"><h2>Run inference</h2>
<form method="POST" action="/inspect/infer">
  <input type="hidden" name="id" value="{id}">
  <textarea name="inputs" rows="4" placeholder="comma-separated values"></textarea>
  <p class="hint">{n} values expected.</p>
  <div class="mt"><button type="submit" class="btn btn-primary">Predict</button></div>
</form></div>"#,
            n = model.network().input_size(),
        )
    }
}
