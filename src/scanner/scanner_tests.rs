use super::*;
use crate::diagnostics::Diag;
use crate::sourceman::SourceFile;

fn scan(text: &str) -> (Vec<(Category, String)>, Vec<Diag>) {
    let source = SourceFile::new(text.to_owned());
    let diagman = DiagnosticManager::new();
    let mut scanner = Scanner::new(&source, &diagman);
    let mut words = Vec::new();
    loop {
        let word = scanner.next_word();
        if word.category == Category::Eof {
            break;
        }
        words.push((word.category, source.lexeme(word.lexeme).to_owned()));
    }
    (words, diagman.codes())
}

fn categories(text: &str) -> Vec<Category> {
    scan(text).0.into_iter().map(|(c, _)| c).collect()
}

#[test]
fn test_keywords_and_identifiers() {
    use Category::*;
    let (words, diags) = scan("if else int return void while main whilex");
    assert!(diags.is_empty());
    let expected = [
        (If, "if"),
        (Else, "else"),
        (Int, "int"),
        (Return, "return"),
        (Void, "void"),
        (While, "while"),
        (Identifier, "main"),
        (Identifier, "whilex"),
    ];
    for ((category, lexeme), (exp_cat, exp_lex)) in words.iter().zip(expected) {
        assert_eq!(*category, exp_cat);
        assert_eq!(lexeme, exp_lex);
    }
}

#[test]
fn test_operators_single_and_double() {
    use Category::*;
    assert_eq!(
        categories("+ - * / ; , ( ) [ ] { } = == < <= > >= !="),
        vec![
            Plus, Minus, Multiply, Divide, Semicolon, Comma, OpenParen, CloseParen,
            OpenBracket, CloseBracket, OpenCurly, CloseCurly, Assign, Equal, Less,
            LessEqual, Greater, GreaterEqual, NotEqual,
        ]
    );
}

#[test]
fn test_adjacent_double_char_operators_without_spaces() {
    use Category::*;
    assert_eq!(categories("a<=b==c"), vec![Identifier, LessEqual, Identifier, Equal, Identifier]);
    // '==' then '=' rather than '=' '=' '='.
    assert_eq!(categories("==="), vec![Equal, Assign]);
}

#[test]
fn test_digit_terminates_identifier() {
    let (words, diags) = scan("abc123 x");
    assert!(diags.is_empty());
    assert_eq!(words[0], (Category::Identifier, String::from("abc")));
    assert_eq!(words[1], (Category::Number, String::from("123")));
    assert_eq!(words[2], (Category::Identifier, String::from("x")));
}

#[test]
fn test_bad_number_consumes_run_and_resyncs() {
    let (words, diags) = scan("123abc456 + 7");
    assert_eq!(diags, vec![Diag::LexerBadNumber]);
    assert_eq!(words[0].0, Category::Plus);
    assert_eq!(words[1], (Category::Number, String::from("7")));
}

#[test]
fn test_bad_char_is_skipped() {
    let (words, diags) = scan("a @ b ! c");
    assert_eq!(diags, vec![Diag::LexerBadChar, Diag::LexerBadChar]);
    assert_eq!(
        words.iter().map(|(_, l)| l.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c"]
    );
}

#[test]
fn test_comments_are_skipped() {
    let (words, diags) = scan("int /* a comment * with stars */ x; /**/ y");
    assert!(diags.is_empty());
    assert_eq!(
        words.iter().map(|(_, l)| l.as_str()).collect::<Vec<_>>(),
        vec!["int", "x", ";", "y"]
    );
}

#[test]
fn test_unclosed_comment_reports_and_ends() {
    let (words, diags) = scan("x /* never closed");
    assert_eq!(diags, vec![Diag::LexerUnclosedComment]);
    assert_eq!(words.len(), 1);
}

#[test]
fn test_comments_do_not_nest() {
    // The first `*/` closes the comment; the rest is scanned as words.
    let (words, _) = scan("/* a /* b */ x");
    assert_eq!(words.len(), 1);
    assert_eq!(words[0].1, "x");
}

#[test]
fn test_ranges_are_monotonic_and_reconstruct_source() {
    let text = "int main(void) { return 40 + 2; } /* tail */";
    let source = SourceFile::new(text.to_owned());
    let diagman = DiagnosticManager::new();
    let mut scanner = Scanner::new(&source, &diagman);

    let mut last_end = 0;
    let mut rebuilt = String::new();
    loop {
        let word = scanner.next_word();
        if word.category == Category::Eof {
            break;
        }
        assert!(word.lexeme.start >= last_end, "ranges must not overlap");
        // Everything between words is whitespace or comment text.
        rebuilt.push_str(&text[last_end as usize..word.lexeme.start as usize]);
        rebuilt.push_str(source.lexeme(word.lexeme));
        last_end = word.lexeme.end;
    }
    rebuilt.push_str(&text[last_end as usize..]);
    assert_eq!(rebuilt, text);
}

#[test]
fn test_eof_is_sticky() {
    let source = SourceFile::new(String::new());
    let diagman = DiagnosticManager::new();
    let mut scanner = Scanner::new(&source, &diagman);
    assert_eq!(scanner.next_word().category, Category::Eof);
    assert_eq!(scanner.next_word().category, Category::Eof);
}
