//! JSON Schema + Markdown生成ツール
//!
//! src/domain/config.rsの設定構造から以下を自動生成します：
//! 1. JSON Schema (schema/config.json)
//! 2. Markdownドキュメント (CONFIGURATION.md)
//!
//! 実行方法:
//! ```
//! cargo run --bin generate_schema
//! ```

use schemars::schema_for;
use serde_json::{Map, Value};
use std::fs;
use steady_hands::domain::config::AppConfig;

fn main() {
    println!("JSON Schema + Markdown生成中...");

    // AppConfigからJSON Schemaを生成
    let schema = schema_for!(AppConfig);
    let json = serde_json::to_string_pretty(&schema).expect("Failed to serialize schema to JSON");

    fs::create_dir_all("schema").expect("Failed to create schema/ directory");
    fs::write("schema/config.json", json.clone()).expect("Failed to write schema/config.json");
    println!("  ✓ schema/config.json");

    let schema_value: Value =
        serde_json::from_str(&json).expect("Failed to parse generated schema");
    let markdown = generate_markdown(&schema_value);

    fs::write("CONFIGURATION.md", markdown).expect("Failed to write CONFIGURATION.md");
    println!("  ✓ CONFIGURATION.md");

    println!("✅ 生成完了: schema/config.json + CONFIGURATION.md");
}

/// JSON Schemaからマークダウンドキュメントを生成
fn generate_markdown(schema: &Value) -> String {
    let mut md = String::new();

    md.push_str("# 設定リファレンス (Configuration Reference)\n\n");
    md.push_str("## 概要\n\n");
    md.push_str("`config.toml`ファイルは、SteadyHandsの動作を制御する設定ファイルです。\n");
    md.push_str("JSON Schemaによる検証により、設定の正確性が保証されています。\n\n");
    md.push_str("**設定ファイルの場所**: `config.toml` (プロジェクトルート)  \n");
    md.push_str("**スキーマファイル**: `schema/config.json` (自動生成)  \n");
    md.push_str("**サンプル**: `config.toml.example`\n\n");
    md.push_str("⚠️ **注意**: このドキュメント（CONFIGURATION.md）は `cargo run --bin generate_schema` で自動生成されます。\n");
    md.push_str("設定項目の説明を変更する場合は、`src/domain/config.rs`のdoc commentsを編集してください。\n\n");
    md.push_str("## 設定ファイルの読み込み\n\n");
    md.push_str("- `config.toml`が存在する場合: ファイルから読み込み\n");
    md.push_str("- ファイルが存在しない場合: デフォルト値を使用（警告ログ出力）\n\n");
    md.push_str("## 設定項目\n\n");

    let defs = schema
        .get("$defs")
        .and_then(|d| d.as_object())
        .cloned()
        .unwrap_or_default();

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, prop) in props {
            md.push_str(&format!("### [{}] - {}\n\n", key, section_title(key)));

            if let Some(desc) = prop.get("description").and_then(|d| d.as_str()) {
                md.push_str(&format!("{}\n\n", desc));
            }

            // セクションは$refで定義を参照する形になる
            if let Some(def_schema) = resolve_ref(prop, &defs) {
                write_properties_table(&mut md, def_schema, &defs);
            } else if prop.get("properties").is_some() {
                write_properties_table(&mut md, prop, &defs);
            }
        }
    }

    md.push_str("## 参考\n\n");
    md.push_str("- [README.md](README.md) - クイックスタート\n");

    md
}

/// $ref参照を$defsから解決する
fn resolve_ref<'a>(schema: &Value, defs: &'a Map<String, Value>) -> Option<&'a Value> {
    let ref_str = schema.get("$ref")?.as_str()?;
    let def_name = ref_str.strip_prefix("#/$defs/")?;
    defs.get(def_name)
}

/// プロパティテーブルを書き出す
fn write_properties_table(md: &mut String, schema: &Value, defs: &Map<String, Value>) {
    let Some(props) = schema.get("properties").and_then(|p| p.as_object()) else {
        return;
    };
    if props.is_empty() {
        return;
    }

    md.push_str("| 設定項目 | 型 | デフォルト | 説明 |\n");
    md.push_str("|---------|-----|---------|---------|\n");

    for (key, prop) in props {
        md.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            key,
            type_string(prop, defs).replace('|', "\\|"),
            default_string(prop),
            description_string(prop)
        ));
    }
    md.push('\n');
}

/// 型を表示用文字列にする
fn type_string(schema: &Value, defs: &Map<String, Value>) -> String {
    if let Some(def_schema) = resolve_ref(schema, defs) {
        if def_schema.get("enum").is_some() {
            return "enum".to_string();
        }
        if def_schema.get("type").and_then(|t| t.as_str()) == Some("object") {
            return "object".to_string();
        }
        return "object".to_string();
    }

    if schema.get("enum").is_some() {
        return "enum".to_string();
    }

    match schema.get("type") {
        Some(Value::String(type_str)) => match type_str.as_str() {
            "integer" | "number" => schema
                .get("format")
                .and_then(|f| f.as_str())
                .unwrap_or(type_str)
                .to_string(),
            "boolean" => "bool".to_string(),
            other => other.to_string(),
        },
        Some(Value::Array(types)) => {
            // Option型は ["array", "null"] のようなユニオンになる
            let names: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
            names.join(" | ")
        }
        _ => "unknown".to_string(),
    }
}

/// デフォルト値を表示用文字列にする
fn default_string(schema: &Value) -> String {
    match schema.get("default") {
        Some(Value::String(s)) => format!("`\"{}\"`", s),
        Some(Value::Number(n)) => format!("`{}`", n),
        Some(Value::Bool(b)) => format!("`{}`", b),
        Some(Value::Null) => "`null`".to_string(),
        _ => "-".to_string(),
    }
}

/// 説明文を表示用文字列にする（改行とパイプをエスケープ）
fn description_string(schema: &Value) -> String {
    if let Some(desc) = schema.get("description").and_then(|d| d.as_str()) {
        return desc
            .replace("\n\n", "<br><br>")
            .replace('\n', " ")
            .replace('|', "\\|");
    }

    if let Some(enum_vals) = schema.get("enum").and_then(|e| e.as_array()) {
        let vals: Vec<String> = enum_vals
            .iter()
            .filter_map(|v| v.as_str().map(|s| format!("`{}`", s)))
            .collect();
        if !vals.is_empty() {
            return format!("値: {}", vals.join(", "));
        }
    }

    "-".to_string()
}

/// セクション見出し名
fn section_title(key: &str) -> String {
    match key {
        "camera" => "カメラ設定".to_string(),
        "tracker" => "ハンドトラッキング設定".to_string(),
        "overlay" => "オーバーレイガイダンス設定".to_string(),
        "orientation" => "向き判定設定".to_string(),
        "session" => "セッション設定".to_string(),
        _ => key.to_string(),
    }
}
