//! HTML backend (forms + simple runner subset).
//!
//! Emits a static document with one form per record type (typed
//! inputs) plus a runner section that wires `ask`-assigned variables
//! to input fields and `show` expressions to output lines via a small
//! inline script. Control flow and user functions are outside the
//! subset and refused with `HTML-0…` codes.

use handc_interp::decode_text_literal;
use handc_ir::{Ir, IrExpr, IrStmt, RecordDecl, IR_VERSION};

use crate::{BackendError, Note};

/// Generate the HTML artifact.
pub fn gen_html(ir: &Ir) -> Result<(String, Vec<Note>), BackendError> {
    if ir.ir_version != IR_VERSION {
        return Err(BackendError::new(
            "HTML-0001",
            format!("Unsupported IR version '{}'.", ir.ir_version),
            None,
        ));
    }

    if let Some(function) = ir.module.functions.first() {
        return Err(BackendError::new(
            "HTML-0100",
            "HTML v0.1 does not support user functions.",
            Some(function.origin.node_ref.clone()),
        ));
    }

    // One pass over the runner subset: ask-assigned inputs, constant
    // assignments, and show lines.
    let mut inputs: Vec<AskInput> = Vec::new();
    let mut script_lines: Vec<String> = Vec::new();
    for stmt in &ir.module.toplevel {
        match stmt {
            IrStmt::Assign {
                name, ty, value, ..
            } => match value {
                IrExpr::Call { callee, args } if callee == "ask" => {
                    let prompt = args
                        .first()
                        .and_then(|a| match a {
                            IrExpr::Lit { value, .. } => value.as_str().map(decode_text_literal),
                            _ => None,
                        })
                        .unwrap_or_default();
                    let numeric = matches!(
                        ty.as_ref().map(|t| t.kind.as_str()),
                        Some("Int") | Some("Float")
                    );
                    inputs.push(AskInput {
                        name: name.clone(),
                        prompt,
                        numeric,
                    });
                    let read = if numeric {
                        format!("Number(document.getElementById(\"var-{name}\").value)")
                    } else {
                        format!("document.getElementById(\"var-{name}\").value")
                    };
                    script_lines.push(format!("  env[\"{name}\"] = {read};"));
                }
                _ => {
                    let js = js_expr(value, stmt)?;
                    script_lines.push(format!("  env[\"{name}\"] = {js};"));
                }
            },
            IrStmt::Show { value, .. } => {
                let js = js_expr(value, stmt)?;
                script_lines.push(format!("  out.push(String({js}));"));
            }
            other => {
                let code = match other {
                    IrStmt::If { .. } | IrStmt::While { .. } => "HTML-0101",
                    _ => "HTML-0102",
                };
                return Err(BackendError::new(
                    code,
                    format!("HTML v0.1 does not support '{}' statements.", other.kind()),
                    Some(other.origin().node_ref.clone()),
                ));
            }
        }
    }

    let mut html: Vec<String> = Vec::new();
    let title = escape_html(&ir.module.name);
    html.push("<!doctype html>".to_string());
    html.push("<html lang=\"en\">".to_string());
    html.push("<head>".to_string());
    html.push("<meta charset=\"utf-8\">".to_string());
    html.push(format!("<title>{title}</title>"));
    html.push("<style>".to_string());
    html.push("body { font-family: sans-serif; margin: 2rem; max-width: 40rem; }".to_string());
    html.push("form, section { margin-bottom: 1.5rem; }".to_string());
    html.push("label { display: block; margin: 0.25rem 0; }".to_string());
    html.push("</style>".to_string());
    html.push("</head>".to_string());
    html.push("<body>".to_string());
    html.push(format!("<h1>{title}</h1>"));

    if !ir.module.types.is_empty() {
        html.push("<section id=\"records\">".to_string());
        for record in &ir.module.types {
            emit_record_form(&mut html, record);
        }
        html.push("</section>".to_string());
    }

    html.push("<section id=\"runner\">".to_string());
    html.push("<h2>Run</h2>".to_string());
    for input in &inputs {
        let name = escape_html(&input.name);
        let prompt = escape_html(&input.prompt);
        let input_type = if input.numeric { "number" } else { "text" };
        html.push(format!(
            "<label>{prompt} <input type=\"{input_type}\" id=\"var-{name}\"></label>"
        ));
    }
    html.push("<button id=\"run\">Run</button>".to_string());
    html.push("<ol id=\"outputs\"></ol>".to_string());
    html.push("</section>".to_string());

    html.push("<script>".to_string());
    html.push("function runProgram() {".to_string());
    html.push("  const env = {};".to_string());
    html.push("  const out = [];".to_string());
    html.extend(script_lines);
    html.push("  const ol = document.getElementById(\"outputs\");".to_string());
    html.push("  ol.innerHTML = \"\";".to_string());
    html.push("  for (const line of out) {".to_string());
    html.push("    const li = document.createElement(\"li\");".to_string());
    html.push("    li.textContent = line;".to_string());
    html.push("    ol.appendChild(li);".to_string());
    html.push("  }".to_string());
    html.push("}".to_string());
    html.push("document.getElementById(\"run\").addEventListener(\"click\", runProgram);".to_string());
    html.push("</script>".to_string());
    html.push("</body>".to_string());
    html.push("</html>".to_string());

    Ok((html.join("\n") + "\n", Vec::new()))
}

struct AskInput {
    name: String,
    prompt: String,
    numeric: bool,
}

fn emit_record_form(html: &mut Vec<String>, record: &RecordDecl) {
    let name = escape_html(&record.name);
    html.push(format!("<form id=\"form-{name}\">"));
    html.push(format!("<h2>{name}</h2>"));
    for field in &record.fields {
        let field_name = escape_html(&field.name);
        let (input_type, required) = match field.ty.kind.as_str() {
            "Int" | "Float" => ("number", true),
            "Bool" => ("checkbox", false),
            "Optional" => ("text", false),
            _ => ("text", true),
        };
        let required_attr = if required { " required" } else { "" };
        html.push(format!(
            "<label>{field_name} <input type=\"{input_type}\" name=\"{field_name}\"{required_attr}></label>"
        ));
    }
    html.push("</form>".to_string());
}

/// Compile the supported expression subset to a JavaScript expression.
fn js_expr(expr: &IrExpr, stmt: &IrStmt) -> Result<String, BackendError> {
    match expr {
        IrExpr::Lit { value, ty } => {
            let kind = ty.as_ref().map(|t| t.kind.as_str());
            Ok(match (kind, value) {
                (Some("Text"), serde_json::Value::String(s)) => {
                    js_string(&decode_text_literal(s))
                }
                (_, serde_json::Value::Null) => "null".to_string(),
                (_, serde_json::Value::Bool(true)) => "true".to_string(),
                (_, serde_json::Value::Bool(false)) => "false".to_string(),
                (_, serde_json::Value::Number(n)) => n.to_string(),
                (_, serde_json::Value::String(s)) => s.clone(),
                _ => {
                    return Err(BackendError::new(
                        "HTML-0200",
                        "Unsupported literal value.",
                        Some(stmt.origin().node_ref.clone()),
                    ));
                }
            })
        }
        IrExpr::Var { name } => Ok(format!("env[\"{name}\"]")),
        IrExpr::Unary { op, expr } => {
            if op != "-" {
                return Err(BackendError::new(
                    "HTML-0200",
                    format!("Unsupported unary op: {op}"),
                    Some(stmt.origin().node_ref.clone()),
                ));
            }
            Ok(format!("(-({}))", js_expr(expr, stmt)?))
        }
        IrExpr::Binary { op, left, right } => {
            let js_op = match op.as_str() {
                "+" | "-" | "*" | "/" | "%" | "<" | "<=" | ">" | ">=" => op.as_str(),
                "==" => "===",
                "!=" => "!==",
                other => {
                    return Err(BackendError::new(
                        "HTML-0200",
                        format!("Unsupported binary op: {other}"),
                        Some(stmt.origin().node_ref.clone()),
                    ));
                }
            };
            Ok(format!(
                "({} {js_op} {})",
                js_expr(left, stmt)?,
                js_expr(right, stmt)?
            ))
        }
        IrExpr::Call { .. } => Err(BackendError::new(
            "HTML-0200",
            "Calls are not supported in HTML show expressions.",
            Some(stmt.origin().node_ref.clone()),
        )),
    }
}

fn js_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
