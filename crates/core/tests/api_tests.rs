//! Library API integration tests
use readmark_core::*;
use rstest::{fixture, rstest};

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).expect("fixture should exist")
}

#[fixture]
fn chrome_page() -> String {
    read_fixture("article_with_chrome.html")
}

#[rstest]
fn test_extract_article_with_chrome(chrome_page: String) {
    let result = extract(&chrome_page, "https://example.com/posts/ownership");

    assert_eq!(result.title, "Understanding Ownership");
    assert!(result.content.starts_with("# Understanding Ownership\n\n"));
    assert!(result.content.contains("\n\n## The Rules\n\n"));
    assert!(result.content.contains("```rust\nlet s = String::from(\"hello\");\nlet t = s;\n```"));
    assert!(result.content.contains("[borrowing guide](https://example.com/docs/borrowing)"));
    assert!(result.content.contains("[official book](https://doc.rust-lang.org/book/)"));
}

#[rstest]
#[case::navigation("Archive")]
#[case::header("Example Blog")]
#[case::sidebar("Related posts")]
#[case::sidebar_links("Lifetimes explained")]
#[case::footer("Copyright")]
#[case::script("analytics")]
#[case::style("font-family")]
fn test_chrome_excluded(chrome_page: String, #[case] noise: &str) {
    let result = extract(&chrome_page, "https://example.com/posts/ownership");
    assert!(!result.content.contains(noise), "{noise} leaked into content:\n{}", result.content);
}

#[rstest]
fn test_selection_diagnostics(chrome_page: String) {
    let extraction = Extractor::new().run(&chrome_page, "");
    let selection = extraction.selection.expect("non-empty input is scored");

    assert!(matches!(selection, Selection::Candidate { score, .. } if score > 20.0));
    assert!(extraction.guard_trips.is_empty());
}

#[rstest]
fn test_is_probably_readable(chrome_page: String) {
    assert!(is_probably_readable(&chrome_page));
    assert!(!is_probably_readable(&read_fixture("empty_content.html")));
}

#[rstest]
fn test_edge_case_empty() {
    let result = extract(&read_fixture("empty_content.html"), "");
    assert!(result.is_empty(), "expected empty result, got {result:?}");
}

#[rstest]
#[case("")]
#[case(" ")]
#[case("\n\t  \r\n")]
fn test_whitespace_only_input(#[case] html: &str) {
    assert_eq!(extract(html, "https://example.com/page"), ExtractionResult::default());
}

#[rstest]
fn test_edge_case_malformed() {
    let result = extract(&read_fixture("malformed_html.html"), "file:///tmp/malformed_html.html");

    assert_eq!(result.title, "malformed_html");
    assert!(result.content.contains("First paragraph, left unclosed"));
    assert!(result.content.contains("Final paragraph, after the mess."));
}

#[rstest]
#[case("日本語の文章、句読点を含む。これはテストです。")]
#[case("Ελληνικά κείμενα, με τόνους και σημεία στίξης.")]
#[case("Русский текст, с запятыми, для проверки.")]
#[case("العربية، مع فواصل، للاختبار.")]
#[case("全角\u{3000}スペース")]
#[case("🦀 and 📚")]
fn test_edge_case_unicode(#[case] expected: &str) {
    let result = extract(&read_fixture("unicode_heavy.html"), "");
    assert_eq!(result.title, "International Text Samples");
    assert!(result.content.contains(expected), "missing {expected:?} in:\n{}", result.content);
}

#[rstest]
fn test_link_farm_pruned() {
    let result = extract(&read_fixture("link_farm.html"), "https://example.com/garden/spring");

    assert_eq!(result.title, "Spring Planting");
    assert!(result.content.contains("Harden off seedlings gradually"));
    assert!(result.content.contains("Water deeply, but not too often"));
    assert!(!result.content.contains("/tag/"));
}

#[rstest]
#[case::absolute_url("https://example.com/docs/getting-started", "getting-started")]
#[case::file_path("/var/archive/release-notes.html", "release-notes")]
#[case::trailing_slash("https://example.com/guides/", "guides")]
#[case::nothing_usable("", "")]
fn test_title_from_source(#[case] source: &str, #[case] expected: &str) {
    let html = "<div><p>Plain text, without any heading.</p></div>";
    assert_eq!(extract(html, source).title, expected);
}

#[rstest]
fn test_title_prefers_heading_over_title_element() {
    let html = "<html><head><title>Site | Page</title></head><body>\
                <article><h1>The Real Heading</h1><p>Body text, with a comma.</p></article></body></html>";
    assert_eq!(extract(html, "").title, "The Real Heading");
}

#[rstest]
fn test_title_falls_back_with_competing_headings() {
    let html = "<html><head><title>Collected Notes</title></head><body>\
                <div><h2>First</h2><p>One, two.</p><h2>Second</h2><p>Three, four.</p></div></body></html>";
    assert_eq!(extract(html, "").title, "Collected Notes");
}

#[rstest]
fn test_deterministic(chrome_page: String) {
    let first = Extractor::new().run(&chrome_page, "https://example.com/posts/ownership");
    let second = Extractor::new().run(&chrome_page, "https://example.com/posts/ownership");
    assert_eq!(first, second);
}

#[rstest]
fn test_nesting_guard() {
    let html = format!("{}<p>buried, deep down</p>{}", "<div>".repeat(600), "</div>".repeat(600));
    let extraction = Extractor::new().run(&html, "");

    assert_eq!(extraction.guard_trips.len(), 1);
    assert_eq!(extraction.guard_trips[0].guard, Guard::NestingDepth);
    assert!(extraction.result.content.contains("buried, deep down"));
    assert!(matches!(extraction.into_strict(), Err(ReadmarkError::ResourceGuardTripped(_))));
}

#[rstest]
fn test_input_size_guard() {
    let config = ExtractConfig::builder().max_input_bytes(64).build();
    let html = format!("<p>{}</p>", "word ".repeat(100));
    let extraction = Extractor::with_config(config).run(&html, "");

    assert_eq!(extraction.guard_trips[0].guard, Guard::InputSize);
    assert!(!extraction.result.content.is_empty());
}

#[rstest]
fn test_readability_builder(chrome_page: String) {
    let config = ExtractConfig::builder().strip_links(true).strip_images(true).build();
    let result = Extractor::with_config(config).extract(&chrome_page, "https://example.com/posts/ownership");

    assert!(result.content.contains("Read the borrowing guide next"));
    assert!(!result.content.contains("]("));
}

#[rstest]
fn test_config_from_toml(chrome_page: String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("readmark.toml");
    std::fs::write(&path, "[markdown]\nstrip_links = true\n").unwrap();

    let config = ExtractConfig::from_toml_file(&path).unwrap();
    let result = extract_with_config(&chrome_page, "", &config);
    assert!(!result.content.contains("](/docs/borrowing)"));
}

#[rstest]
fn test_config_rejects_unknown_keys() {
    assert!(ExtractConfig::from_toml_str("[scoring]\nno_such_key = 1\n").is_err());
}

#[rstest]
fn test_output_formats(chrome_page: String) {
    let extraction = Extractor::new().run(&chrome_page, "https://example.com/posts/ownership");

    let markdown = extraction.to_format(OutputFormat::Markdown, "https://example.com/posts/ownership", true).unwrap();
    assert!(markdown.starts_with("+++\ntitle = \"Understanding Ownership\"\n"));

    let json = extraction.to_format(OutputFormat::Json, "https://example.com/posts/ownership", false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["title"], "Understanding Ownership");
    assert_eq!(value["selection"]["strategy"], "candidate");
    assert!(value.get("source").is_none());
}

#[rstest]
fn test_pipeline_stages_compose(chrome_page: String) {
    let config = ExtractConfig::default();
    let mut tree = DomTree::parse(&chrome_page, &config.limits).expect("non-empty input");
    assert!(strip_structural(&mut tree) > 0);

    let node = select_main_content(&tree, &config.scoring).node();
    assert_eq!(tree.kind(node), Some(ElementKind::Article));

    prune_low_value(&mut tree, node, &config.prune);
    let title = resolve_title(&tree, node, "", &config.title);
    let content = convert_to_markdown(&tree, node, None, &config.markdown);

    assert_eq!(title, "Understanding Ownership");
    assert!(content.contains("[borrowing guide](/docs/borrowing)"));
}

#[rstest]
fn test_code_block_preserved_verbatim() {
    let html = "<article><p>Example, below.</p><pre><code>const x = 1;\nconsole.log(x);</code></pre></article>";
    let result = extract(html, "");
    assert!(result.content.contains("```\nconst x = 1;\nconsole.log(x);\n```"));
}

#[rstest]
fn test_code_block_inside_inline_wrapper() {
    let html = "<article><p>Intro, here, now.</p>\
                <span><pre><code>const x = 1;\nconsole.log(x);</code></pre></span></article>";
    let result = extract(html, "");
    assert_eq!(result.content, "Intro, here, now.\n\n```\nconst x = 1;\nconsole.log(x);\n```");
}

#[rstest]
fn test_anti_flicker_body_still_extracted() {
    let html = "<html><head><title>T</title></head><body style=\"visibility:hidden\">\
                <article><h1>Real</h1><p>Real article text, with commas, here.</p></article></body></html>";
    let result = extract(html, "");

    assert_eq!(result.title, "Real");
    assert!(result.content.contains("Real article text, with commas, here."));
}

#[rstest]
fn test_nesting_guard_drops_noise_text() {
    let inner = "<script>var SECRET_SCRIPT = 1;</script><style>.x{color:red}</style>\
                 <nav>NAVTEXT</nav><p>Body, text, here.</p>";
    let html = format!("{}{inner}{}", "<div>".repeat(600), "</div>".repeat(600));
    let content = extract(&html, "").content;

    assert!(content.contains("Body, text, here."));
    for noise in ["SECRET_SCRIPT", "color:red", "NAVTEXT"] {
        assert!(!content.contains(noise), "{noise} leaked into content:\n{content}");
    }
}

#[rstest]
fn test_huge_ordered_list_start() {
    let result = extract(r#"<ol start="9223372036854775807"><li>a, b</li><li>c, d</li></ol>"#, "");
    assert!(result.content.contains("a, b"));
    assert!(result.content.contains("c, d"));
}

#[rstest]
#[case("<h1># Already marked</h1><p>Text, here.</p>", "Already marked")]
#[case("<html><head><title>## Hashed title</title></head><body><p>Text, here.</p></body></html>", "Hashed title")]
#[case("<h1>Split\n   across\tlines</h1><p>Text, here.</p>", "Split across lines")]
fn test_title_is_single_plain_line(#[case] html: &str, #[case] expected: &str) {
    let title = extract(html, "").title;
    assert_eq!(title, expected);
    assert!(!title.starts_with('#'));
    assert!(!title.contains('\n'));
}

#[rstest]
fn test_filters_idempotent(chrome_page: String) {
    let config = ExtractConfig::default();
    let mut tree = DomTree::parse(&chrome_page, &config.limits).unwrap();
    strip_structural(&mut tree);
    let node = select_main_content(&tree, &config.scoring).node();
    prune_low_value(&mut tree, node, &config.prune);
    let once = convert_to_markdown(&tree, node, None, &config.markdown);

    assert_eq!(strip_structural(&mut tree), 0);
    assert_eq!(prune_low_value(&mut tree, node, &config.prune), 0);
    assert_eq!(convert_to_markdown(&tree, node, None, &config.markdown), once);
}
