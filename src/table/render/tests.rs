use super::*;

fn amoxil_lookup() -> UrlMap {
    [(
        "sirop-amoxil".to_string(),
        "https://x/y/Amoxil.png".to_string(),
    )]
    .into_iter()
    .collect()
}

fn medication_table() -> Dataset {
    Dataset::from_text(
        &["Nom", "Dosage", "Forme"],
        &[&["Amoxil", "500mg", "x"], &["", "", "y"]],
    )
}

fn renderer(strategy: LinkStrategy) -> TableRenderer {
    TableRenderer::new(RenderOptions {
        strategy,
        ..RenderOptions::default()
    })
}

#[test]
fn empty_dataset_renders_placeholder() {
    let dataset = Dataset::from_text(&["Nom", "Dosage"], &[]);
    let html = render(&dataset, "t", "Sirop", None, 0);
    assert_eq!(html, EMPTY_TABLE_PLACEHOLDER);

    let no_columns = Dataset::default();
    assert_eq!(render(&no_columns, "t", "Sirop", None, 0), EMPTY_TABLE_PLACEHOLDER);
}

#[test]
fn name_cell_links_through_lookup() {
    let lookup = amoxil_lookup();
    let html = render(&medication_table(), "t", "Sirop", Some(&lookup), 0);

    assert!(html.contains(
        "<a href=\"#\" class=\"external-image-popup\" data-url=\"https://x/y/Amoxil.png\" data-filename=\"Amoxil.png\">Amoxil</a>"
    ));
}

#[test]
fn lookup_miss_renders_plain_text() {
    let mut lookup = amoxil_lookup();
    lookup.remove("sirop-amoxil");
    let html = render(&medication_table(), "t", "Sirop", Some(&lookup), 0);

    assert!(html.contains("<td>Amoxil</td>"));
    assert!(!html.contains("data-url"));
}

#[test]
fn lookup_is_scoped_by_category() {
    let lookup = amoxil_lookup();
    let html = render(&medication_table(), "t", "Gouttes", Some(&lookup), 0);
    assert!(html.contains("<td>Amoxil</td>"));
}

#[test]
fn lookup_matches_accent_and_case_variants() {
    let lookup: UrlMap = [(
        "comprimes-doliprane_1000".to_string(),
        "https://x/Doliprane 1000.png".to_string(),
    )]
    .into_iter()
    .collect();
    let dataset = Dataset::from_text(&["Nom"], &[&["DOLIPRANE 1000"]]);

    let link = renderer(LinkStrategy::LookupBacked)
        .resolve_link("DOLIPRANE 1000", 0, "Comprimés", Some(&lookup))
        .expect("lookup link");
    assert_eq!(link.url, "https://x/Doliprane 1000.png");
    assert_eq!(link.label, "Doliprane 1000.png");

    let html = render(&dataset, "t", "Comprimés", Some(&lookup), 0);
    assert!(html.contains(">DOLIPRANE 1000</a>"));
}

#[test]
fn lookup_applies_only_to_name_column() {
    let lookup = amoxil_lookup();
    let dataset = Dataset::from_text(&["Forme", "Nom"], &[&["Amoxil", "Amoxil"]]);
    let html = render(&dataset, "t", "Sirop", Some(&lookup), 1);

    assert!(html.contains("<td>Amoxil</td>"));
    assert_eq!(html.matches("data-url").count(), 1);
}

#[test]
fn literal_url_links_in_any_column() {
    let dataset = Dataset::from_text(
        &["Nom", "Image"],
        &[&["https://example.com/a.png", "https://example.com/a.png"]],
    );

    for strategy in [LinkStrategy::LookupBacked, LinkStrategy::RawUrlOnly] {
        let lookup = amoxil_lookup();
        let html = renderer(strategy).render(&dataset, "t", "Sirop", Some(&lookup));
        assert_eq!(
            html.matches("data-url=\"https://example.com/a.png\"").count(),
            2,
            "strategy {}",
            strategy.as_str()
        );
        assert!(html.contains("data-filename=\"a.png\">a.png</a>"));
    }
}

#[test]
fn literal_url_without_segment_keeps_original_text() {
    let link = renderer(LinkStrategy::RawUrlOnly)
        .resolve_link("https://example.com/", 2, "Sirop", None)
        .expect("literal url link");
    assert_eq!(link.url, "https://example.com/");
    assert_eq!(link.label, "image");

    let dataset = Dataset::from_text(&["Image"], &[&["https://example.com/"]]);
    let html = render(&dataset, "t", "Sirop", None, 0);
    assert!(html.contains(">https://example.com/</a>"));
}

#[test]
fn literal_url_label_drops_query_string() {
    let link = renderer(LinkStrategy::RawUrlOnly)
        .resolve_link("https://example.com/img/b.jpg?raw=true", 0, "", None)
        .expect("literal url link");
    assert_eq!(link.label, "b.jpg");
}

#[test]
fn raw_url_only_strategy_ignores_lookup() {
    let lookup = amoxil_lookup();
    let html =
        renderer(LinkStrategy::RawUrlOnly).render(&medication_table(), "t", "Sirop", Some(&lookup));
    assert!(html.contains("<td>Amoxil</td>"));
}

#[test]
fn no_links_strategy_renders_plain_text() {
    let lookup = amoxil_lookup();
    let dataset = Dataset::from_text(&["Nom", "Image"], &[&["Amoxil", "https://x/a.png"]]);
    let html = renderer(LinkStrategy::NoLinks).render(&dataset, "t", "Sirop", Some(&lookup));

    assert!(!html.contains("<a "));
    assert!(html.contains("<td>https://x/a.png</td>"));
}

#[test]
fn merged_cells_emit_rowspan_and_skip_absorbed_cells() {
    let html = render(&medication_table(), "t", "Sirop", None, 0);

    assert!(html.contains("<tr><td>Amoxil</td><td rowspan=\"2\">500mg</td><td>x</td></tr>"));
    assert!(html.contains("<tr><td></td><td>y</td></tr>"));
}

#[test]
fn empty_header_names_extend_previous_header() {
    let dataset = Dataset::from_text(
        &["Nom", "Posologie", "", "", "Forme"],
        &[&["a", "b", "c", "d", "e"]],
    );
    let html = render(&dataset, "t", "", None, 0);

    assert!(html.contains(
        "<thead><tr><th>Nom</th><th colspan=\"3\">Posologie</th><th>Forme</th></tr></thead>"
    ));
}

#[test]
fn leading_empty_header_spans_its_run() {
    let dataset = Dataset::from_text(&["", "", "Forme"], &[&["a", "b", "c"]]);
    let html = render(&dataset, "t", "", None, 0);
    assert!(html.contains("<thead><tr><th colspan=\"2\"></th><th>Forme</th></tr></thead>"));
}

#[test]
fn cell_text_and_attributes_are_escaped() {
    let dataset = Dataset::from_text(
        &["<Nom>"],
        &[&["Tom & \"Jerry\" <b>"], &["https://x/a.png?q=1&r='2'"]],
    );
    let html = render(&dataset, "t\"id", "", None, 0);

    assert!(html.contains("<th>&lt;Nom&gt;</th>"));
    assert!(html.contains("<td>Tom &amp; &quot;Jerry&quot; &lt;b&gt;</td>"));
    assert!(html.contains("data-url=\"https://x/a.png?q=1&amp;r=&#x27;2&#x27;\""));
    assert!(html.contains("id=\"t&quot;id\""));
    assert!(!html.contains("<b>"));
}

#[test]
fn style_block_is_scoped_to_table_id() {
    let html = render(&medication_table(), "table_Sirop_Feuil1", "Sirop", None, 0);
    assert!(html.starts_with("<style>"));
    assert!(html.contains("table#table_Sirop_Feuil1 th {"));
    assert!(html.contains("<table class=\"dataframe\" id=\"table_Sirop_Feuil1\">"));
}
