use crate::models::{
    AnalysisReport, ChecklistItem, CompetitorAnalysis, CompetitorListing, CurrentData,
    KeywordCount, KeywordGapEntry, ListingSnapshot, Priority, SuggestedTitle,
};

/// Character budget for the title part of a suggested title.
pub const TITLE_BUDGET: usize = 60;

struct TitleTemplate {
    intent: &'static str,
    suffix: &'static str,
    coverage: u8,
    reasoning: &'static str,
}

const TITLE_TEMPLATES: [TitleTemplate; 3] = [
    TitleTemplate {
        intent: "Busqueda Informativa",
        suffix: "Envio Gratis",
        coverage: 85,
        reasoning: "Los usuarios buscan envio gratis",
    },
    TitleTemplate {
        intent: "Intencion de Compra",
        suffix: "Mejor Precio",
        coverage: 92,
        reasoning: "Precio es factor decisivo",
    },
    TitleTemplate {
        intent: "Especifico",
        suffix: "Stock Disponible",
        coverage: 88,
        reasoning: "Disponibilidad genera confianza",
    },
];

const DESCRIPTION_BENEFITS: &[&str] = &[
    "Producto de EXCELENTE calidad",
    "✓ Envio rapido y seguro",
    "✓ Garantia oficial",
    "✓ Compra 100% protegida",
];

/// Builds the report from already computed pieces. Pure.
pub fn assemble_report(
    snapshot: &ListingSnapshot,
    competitors: &[CompetitorListing],
    your_keywords: &[KeywordCount],
    competitor_keywords: &[KeywordCount],
    gap: &[KeywordGapEntry],
) -> AnalysisReport {
    let gap_words: Vec<&str> = gap.iter().map(|entry| entry.keyword.as_str()).collect();
    AnalysisReport {
        current_data: CurrentData {
            title: snapshot.title.clone(),
            price: snapshot.price,
            description: snapshot.description.clone(),
            competitor_count: competitors.len(),
        },
        suggested_titles: suggested_titles(&snapshot.title),
        optimized_description: optimized_description(&snapshot.title, &gap_words),
        your_keywords: your_keywords.to_vec(),
        competitor_analysis: CompetitorAnalysis {
            top_keywords: competitor_keywords.to_vec(),
            missing_keywords: gap
                .iter()
                .map(|entry| KeywordCount {
                    word: entry.keyword.clone(),
                    count: entry.importance,
                })
                .collect(),
            average_price: average_price(competitors),
        },
        competitors: competitors.to_vec(),
        keyword_gap: gap.to_vec(),
        checklist: checklist(&gap_words),
    }
}

pub fn suggested_titles(title: &str) -> Vec<SuggestedTitle> {
    let base = truncate_chars(title, TITLE_BUDGET);
    TITLE_TEMPLATES
        .iter()
        .map(|template| SuggestedTitle {
            intent: template.intent,
            title: format!("{base} | {}", template.suffix),
            coverage: template.coverage,
            reasoning: template.reasoning,
        })
        .collect()
}

pub fn optimized_description(title: &str, gap_words: &[&str]) -> String {
    let mut out = format!("{title}\n\n{}", DESCRIPTION_BENEFITS.join("\n"));
    if !gap_words.is_empty() {
        out.push_str(&format!("\n\nPalabras relacionadas: {}", gap_words.join(", ")));
    }
    out
}

fn checklist(gap_words: &[&str]) -> Vec<ChecklistItem> {
    let keyword_task = if gap_words.is_empty() {
        "Mantener palabras clave alineadas con la competencia".to_string()
    } else {
        format!("Anadir palabras clave: {}", gap_words.join(", "))
    };
    vec![
        ChecklistItem {
            task: keyword_task,
            priority: Priority::P0,
            impact: "Visibilidad",
        },
        ChecklistItem {
            task: "Optimizar descripcion con beneficios".into(),
            priority: Priority::P0,
            impact: "Conversion",
        },
        ChecklistItem {
            task: "Revisar precio vs competencia".into(),
            priority: Priority::P1,
            impact: "Ventas",
        },
        ChecklistItem {
            task: "Mejorar fotos y presentacion".into(),
            priority: Priority::P1,
            impact: "Confianza",
        },
    ]
}

fn average_price(competitors: &[CompetitorListing]) -> Option<f64> {
    if competitors.is_empty() {
        return None;
    }
    let total: f64 = competitors.iter().map(|c| c.price).sum();
    let mean = total / competitors.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect::<String>().trim_end().to_string()
}
