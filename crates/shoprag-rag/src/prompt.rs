use shoprag_core::types::Chunk;

const PREAMBLE: &str = "You are a cruelty-free shopping assistant.
You have information about luxury products that use animal materials and their vegan alternatives.
Use the following product information to answer the user's question clearly and helpfully.

For each relevant product, explain:
- Which animals are harmed and why
- Product price
- Vegan alternatives with materials and prices
- Why someone should choose the vegan alternative
";

const CLOSING: &str = "Provide a compassionate, informative answer that helps users make cruelty-free choices.";

/// Build the grounding prompt. Chunk texts appear in the order given, then
/// the query verbatim.
pub fn assemble_prompt(query: &str, chunks: &[Chunk]) -> String {
    let context = chunks.iter().map(|c| c.text.as_str()).collect::<Vec<_>>().join("\n");
    format!("{PREAMBLE}\nProduct Data:\n{context}\nUser query: {query}\n\n{CLOSING}\n")
}
