use html_tree_builder::TreeBuilderConfig;
use html_tree_builder_test_support::parse_document;

fn main() {
    divan::main();
}

/// A page with the usual mix of sections, lists, tables and misnested markup.
fn synthetic_document(sections: usize) -> String {
    let mut html = String::from("<!DOCTYPE html><html lang=en><head><title>Bench</title></head><body>");
    for i in 0..sections {
        html.push_str(&format!(
            "<section id=s{i}><h2>Section {i}</h2><p>Some <b>bold <i>and</b> italic</i> text.\
             <ul><li>one<li>two<li><a href=#x{i}>three</a></ul>\
             <table><tr><td>a<td>b<tr><td>c</table>\
             <svg viewBox='0 0 1 1'><circle r=1 /></svg>\
             <p>unclosed <em>formatting"
        ));
    }
    html.push_str("</body></html>");
    html
}

#[divan::bench(args = [10, 100, 1000], skip_ext_time = true)]
fn build_tree(bencher: divan::Bencher, sections: usize) {
    let input = synthetic_document(sections);
    bencher.bench(|| parse_document(&input, TreeBuilderConfig::default()));
}

#[divan::bench(skip_ext_time = true)]
fn build_tree_without_error_reporting(bencher: divan::Bencher) {
    let input = synthetic_document(100);
    let config = TreeBuilderConfig::default().with_error_reporting(false);
    bencher.bench(|| parse_document(&input, config.clone()));
}
