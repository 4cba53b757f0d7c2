#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shoprag_core::config::Settings;
use shoprag_core::error::GenerationError;
use shoprag_core::traits::{Embedder, Generator};
use shoprag_rag::RagEngine;

pub const HEADER: &str = "Product Name,Category,Animal Materials Used,Animal Cruelty Flag,Cruelty Note,Estimated Price,Vegan Alternative,Material,Price,Why Choose Vegan";

const VOCAB: [&str; 8] = ["ostrich", "leather", "wool", "silk", "fur", "mink", "cashmere", "python"];

/// Counts vocabulary words; one extra constant component keeps empty text
/// from embedding to the zero vector.
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) }
    }

    fn embed_one(text: &str) -> Vec<f32> {
        let mut v = vec![0f32; VOCAB.len() + 1];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let token = token.to_lowercase();
            if let Some(i) = VOCAB.iter().position(|w| *w == token) {
                v[i] += 1.0;
            }
        }
        v[VOCAB.len()] = 0.1;
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        v.iter().map(|x| x / norm).collect()
    }
}

impl Embedder for KeywordEmbedder {
    fn embedder_id(&self) -> &str { "keyword:test" }
    fn dim(&self) -> usize { VOCAB.len() + 1 }
    fn max_len(&self) -> usize { usize::MAX }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| Self::embed_one(t)).collect())
    }
}

pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn embedder_id(&self) -> &str { "keyword:test" }
    fn dim(&self) -> usize { 9 }
    fn max_len(&self) -> usize { 16 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model offline")
    }
}

/// Returns the prompt it receives.
pub struct EchoGenerator;

impl Generator for EchoGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(prompt.to_string())
    }
}

pub struct FailingGenerator(pub GenerationError);

impl Generator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(self.0.clone())
    }
}

pub fn row(name: &str, category: &str, material: &str, vegan_material: &str, vegan_price: &str) -> String {
    format!(
        "{name},{category},{material},Yes,Animals are farmed and killed,\"$1,500\",Vegan {name},{vegan_material},\"{vegan_price}\",Kinder to animals\n"
    )
}

/// Twelve products; only the Birkin mentions ostrich.
pub fn sample_catalog() -> String {
    let mut body = String::new();
    body.push_str(&row("Birkin Bag", "Handbags", "Ostrich leather", "Apple leather", "$350"));
    body.push_str(&row("Loafers", "Shoes", "Calf leather", "Cork", "$90"));
    body.push_str(&row("Merino Coat", "Outerwear", "Merino wool", "Recycled polyester", "$180"));
    body.push_str(&row("Silk Scarf", "Accessories", "Mulberry silk", "Tencel", "$45"));
    body.push_str(&row("Mink Stole", "Outerwear", "Mink fur", "Faux fur", "$220"));
    body.push_str(&row("Cashmere Sweater", "Knitwear", "Cashmere wool", "Organic cotton", "$75"));
    body.push_str(&row("Python Clutch", "Handbags", "Python skin", "Pinatex", "$160"));
    body.push_str(&row("Fur Hat", "Accessories", "Fox fur", "Acrylic", "Price on request"));
    body.push_str(&row("Wool Scarf", "Accessories", "Lambswool", "Recycled acrylic", "$30"));
    body.push_str(&row("Leather Belt", "Accessories", "Cowhide leather", "Mushroom leather", "$60"));
    body.push_str(&row("Silk Tie", "Accessories", "Silk", "Recycled satin", "$40"));
    body.push_str(&row("Suede Boots", "Shoes", "Suede", "Microsuede", "$130"));
    body
}

pub fn write_catalog(dir: &Path, body: &str) {
    fs::write(dir.join("catalog.csv"), format!("{HEADER}\n{body}")).unwrap();
}

pub fn settings() -> Settings {
    let mut s = Settings::default();
    s.data.catalog_path = "catalog.csv".to_string();
    s.data.index_dir = "index".to_string();
    s.embedding.batch_size = 4;
    s
}

pub fn engine(dir: &Path, embedder: Arc<dyn Embedder>, generator: Option<Arc<dyn Generator>>) -> RagEngine {
    RagEngine::new(settings(), dir, embedder, generator)
}
