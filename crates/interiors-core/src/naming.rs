//! Filename to display-name derivation.
//!
//! An uploaded `modern_living-room.jpg` becomes the record name
//! `Modern Living Room`: the final extension is dropped, `_` and `-` become
//! spaces, and the result is title-cased.

/// Strip any directory components a client may have sent with the filename.
///
/// Browsers on some platforms submit `C:\fakepath\photo.jpg`; only the last
/// component is meaningful.
pub fn base_filename(raw: &str) -> &str {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw)
}

/// Remove the text after the last `.` (and the dot itself).
///
/// A filename without a dot is returned whole.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(idx) => &filename[..idx],
        None => filename,
    }
}

/// Title-case `s`: a cased character that follows a cased character is
/// lower-cased, any other cased character is mapped to its titlecase form.
///
/// Digits, spaces and punctuation are word boundaries, so `3d render`
/// becomes `3D Render` and `SOFA` becomes `Sofa`.
///
/// Titlecase differs from uppercase for a handful of characters: `ß` starts
/// a word as `Ss`, the digraphs `ǆ`, `ǉ`, `ǌ` and `ǳ` become `ǅ`, `ǈ`, `ǋ`
/// and `ǲ`, Latin and Armenian ligatures open with one capital (`ﬁ` is `Fi`),
/// Greek letters with ypogegrammeni keep the iota subscript, and Georgian
/// Mkhedruli letters are left as they are.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;

    for c in s.chars() {
        let cased = c.is_uppercase() || c.is_lowercase() || is_titlecase_letter(c);
        if cased {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                push_titlecase(&mut out, c);
            }
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }

    out
}

/// Letters of general category `Lt`.
fn is_titlecase_letter(c: char) -> bool {
    matches!(
        c,
        '\u{01C5}'
            | '\u{01C8}'
            | '\u{01CB}'
            | '\u{01F2}'
            | '\u{1F88}'..='\u{1F8F}'
            | '\u{1F98}'..='\u{1F9F}'
            | '\u{1FA8}'..='\u{1FAF}'
            | '\u{1FBC}'
            | '\u{1FCC}'
            | '\u{1FFC}'
    )
}

fn push_titlecase(out: &mut String, c: char) {
    let mapped: &str = match c {
        'ß' => "Ss",
        '\u{01C4}'..='\u{01C6}' => "\u{01C5}",
        '\u{01C7}'..='\u{01C9}' => "\u{01C8}",
        '\u{01CA}'..='\u{01CC}' => "\u{01CB}",
        '\u{01F1}'..='\u{01F3}' => "\u{01F2}",
        '\u{0587}' => "\u{0535}\u{0582}",
        '\u{FB00}' => "Ff",
        '\u{FB01}' => "Fi",
        '\u{FB02}' => "Fl",
        '\u{FB03}' => "Ffi",
        '\u{FB04}' => "Ffl",
        '\u{FB05}' | '\u{FB06}' => "St",
        '\u{FB13}' => "\u{0544}\u{0576}",
        '\u{FB14}' => "\u{0544}\u{0565}",
        '\u{FB15}' => "\u{0544}\u{056B}",
        '\u{FB16}' => "\u{054E}\u{0576}",
        '\u{FB17}' => "\u{0544}\u{056D}",
        '\u{1FB2}' => "\u{1FBA}\u{0345}",
        '\u{1FB4}' => "\u{0386}\u{0345}",
        '\u{1FB7}' => "\u{0391}\u{0342}\u{0345}",
        '\u{1FC2}' => "\u{1FCA}\u{0345}",
        '\u{1FC4}' => "\u{0389}\u{0345}",
        '\u{1FC7}' => "\u{0397}\u{0342}\u{0345}",
        '\u{1FF2}' => "\u{1FFA}\u{0345}",
        '\u{1FF4}' => "\u{038F}\u{0345}",
        '\u{1FF7}' => "\u{03A9}\u{0342}\u{0345}",
        '\u{1F80}'..='\u{1F87}' | '\u{1F90}'..='\u{1F97}' | '\u{1FA0}'..='\u{1FA7}' => {
            out.push(char::from_u32(c as u32 + 8).unwrap_or(c));
            return;
        }
        '\u{1FB3}' => "\u{1FBC}",
        '\u{1FC3}' => "\u{1FCC}",
        '\u{1FF3}' => "\u{1FFC}",
        '\u{10D0}'..='\u{10FA}' | '\u{10FD}'..='\u{10FF}' => {
            out.push(c);
            return;
        }
        c if is_titlecase_letter(c) => {
            out.push(c);
            return;
        }
        _ => {
            out.extend(c.to_uppercase());
            return;
        }
    };
    out.push_str(mapped);
}

/// Derive the human-readable display name for an uploaded file.
///
/// The result may be empty (e.g. for `.jpg`); callers must treat that as a
/// construction failure.
pub fn display_name_from_filename(filename: &str) -> String {
    let stem = strip_extension(base_filename(filename));
    title_case(&stem.replace(['_', '-'], " "))
}
