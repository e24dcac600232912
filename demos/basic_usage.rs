//! Basic usage example of the pegmark scanner

use pegmark::{Document, GrammarSource, MarkupScanner, ScanOptions};

fn run(grammar: &str, options: &[(&str, &str)], xml: &str) -> Result<String, Box<dyn std::error::Error>> {
    let options = ScanOptions::from_map(options.iter().copied());
    let scanner = MarkupScanner::new(&GrammarSource::text(grammar), options)?;
    let mut document = Document::from_xml(xml)?;
    scanner.scan(&mut document)?;
    Ok(document.to_xml())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== pegmark Basic Usage Example ===\n");

    // Example 1: Numbers anywhere in running text
    println!("Example 1: Numbers in text");
    let input1 = "<p>Rooms 12 and 34 are free.</p>";
    println!("Input:  {}", input1);
    println!("Output: {}\n", run("num <- +[0-9]", &[], input1)?);

    // Example 2: Calculator, pruning single-child nodes
    println!("Example 2: Calculator");
    let calculator = r#"
        sum   <= prod *(ws [+\-] ws prod)
        prod  <= unary *(ws [*/] ws unary)
        unary <= '-' ws unary
               | :'(' ws sum ws :')'
               | num
        num   <- +[0-9] ?('.' +[0-9])
        ws    <: *[ \t\n\r]
    "#;
    let input2 = "<r>The value of <c>1 + 2*3</c> in binary is <c>111</c></r>";
    println!("Input:  {}", input2);
    println!(
        "Output: {}\n",
        run(calculator, &[("withinElementName", "c")], input2)?
    );

    // Example 3: Existing markup consumed as tokens
    println!("Example 3: Pre-parsed elements");
    let input3 = "<r><number>1</number> + <number>23</number></r>";
    println!("Input:  {}", input3);
    println!(
        "Output: {}\n",
        run("sum <- <number> *(' + ' <number>)", &[], input3)?
    );

    // Example 4: Diacritics folded before matching
    println!("Example 4: Normalized input");
    let input4 = "<p>Crème brûlée, naïve café</p>";
    println!("Input:  {}", input4);
    println!(
        "Output: {}\n",
        run(
            "word <- +[a-zA-Z]",
            &[("normalize", "true"), ("matchWholeWords", "true")],
            input4
        )?
    );

    // Example 5: Parse errors as markup
    println!("Example 5: Parse error markers");
    let input5 = "<p>12a</p>";
    println!("Input:  {}", input5);
    println!(
        "Output: {}\n",
        run(
            "num <- +[0-9]",
            &[("completeMatch", "true"), ("showParseErrors", "true")],
            input5
        )?
    );

    println!("=== All examples completed successfully! ===");

    Ok(())
}
