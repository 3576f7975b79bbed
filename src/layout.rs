use crate::types::{Line, PageChars, PdfChar, Word};

/// Reading-order text runs for a page, the unit a text layer renders as
/// one node. A line splits into several runs wherever superscript state
/// changes, the way inline formatting fragments rendered text.
pub fn text_runs(page: &PageChars) -> Vec<String> {
    if page.chars.is_empty() {
        return Vec::new();
    }
    let dominant_font_size = dominant_font_size(&page.chars);
    let gap_threshold = avg_char_width(&page.chars) * 0.3;

    let words = group_chars_into_words(&page.chars, gap_threshold, dominant_font_size);
    let lines = split_columns(group_words_into_lines(words), page.width);
    lines.iter().flat_map(line_runs).collect()
}

fn avg_char_width(chars: &[PdfChar]) -> f32 {
    let widths: Vec<f32> = chars.iter().filter(|c| c.width > 0.0).map(|c| c.width).collect();
    if widths.is_empty() {
        return 5.0;
    }
    widths.iter().sum::<f32>() / widths.len() as f32
}

fn dominant_font_size(chars: &[PdfChar]) -> f32 {
    let mut size_counts: Vec<(i32, usize)> = Vec::new();
    for ch in chars {
        let key = (ch.font_size * 10.0) as i32;
        match size_counts.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 += 1,
            None => size_counts.push((key, 1)),
        }
    }
    size_counts
        .iter()
        .max_by_key(|(_, count)| *count)
        .map(|(key, _)| *key as f32 / 10.0)
        .unwrap_or(10.0)
}

fn is_superscript(ch_size: f32, dominant_size: f32) -> bool {
    ch_size < dominant_size * 0.75
}

#[derive(Default)]
struct WordAccum {
    text: String,
    x: f32,
    y: f32,
    max_x: f32,
    font_size: f32,
    prev_right: f32,
}

impl WordAccum {
    fn push(&mut self, ch: &PdfChar) {
        if self.text.is_empty() {
            self.x = ch.x;
            self.y = ch.y;
            self.font_size = ch.font_size;
            self.max_x = ch.x + ch.width;
        } else {
            self.max_x = self.max_x.max(ch.x + ch.width);
        }
        self.text.push(ch.ch);
    }

    fn flush(&mut self, words: &mut Vec<Word>, dominant_font_size: f32) {
        if self.text.is_empty() {
            return;
        }
        words.push(Word {
            text: std::mem::take(&mut self.text),
            x: self.x,
            y: self.y,
            width: self.max_x - self.x,
            font_size: self.font_size,
            is_superscript: is_superscript(self.font_size, dominant_font_size),
        });
    }
}

fn group_chars_into_words(chars: &[PdfChar], gap_threshold: f32, dominant_font_size: f32) -> Vec<Word> {
    let mut words = Vec::new();
    let mut acc = WordAccum::default();

    for ch in chars {
        if ch.ch.is_whitespace() {
            acc.flush(&mut words, dominant_font_size);
            acc.prev_right = ch.x + ch.width;
            continue;
        }
        let detached = (ch.x - acc.prev_right) > gap_threshold
            || (ch.y - acc.y).abs() > dominant_font_size * 0.5;
        if detached {
            acc.flush(&mut words, dominant_font_size);
        }
        acc.push(ch);
        acc.prev_right = ch.x + ch.width;
    }
    acc.flush(&mut words, dominant_font_size);
    words
}

fn group_words_into_lines(words: Vec<Word>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for word in words {
        let merged = lines
            .iter_mut()
            .rev()
            .take(5)
            .find(|line| (word.y - line.y).abs() < word.font_size * 0.5);

        match merged {
            Some(line) => line.words.push(word),
            None => lines.push(make_line(vec![word])),
        }
    }

    for line in &mut lines {
        line.words.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    // top to bottom: PDF y grows upward
    lines.sort_by(|a, b| b.y.total_cmp(&a.y));
    lines
}

/// Reorder a two-column page into left column then right column.
fn split_columns(lines: Vec<Line>, page_width: f32) -> Vec<Line> {
    let Some(boundary) = detect_column_boundary(&lines, page_width) else {
        return lines;
    };

    let mut left_lines = Vec::new();
    let mut right_lines = Vec::new();
    for line in lines {
        let (left, right): (Vec<Word>, Vec<Word>) = line
            .words
            .into_iter()
            .partition(|w| w.x + w.width / 2.0 < boundary);
        if !left.is_empty() {
            left_lines.push(make_line(left));
        }
        if !right.is_empty() {
            right_lines.push(make_line(right));
        }
    }
    left_lines.extend(right_lines);
    left_lines
}

/// Centre of an empty vertical strip in the middle 30-70% of the page.
fn detect_column_boundary(lines: &[Line], page_width: f32) -> Option<f32> {
    const BUCKETS: usize = 200;
    if page_width <= 0.0 || lines.is_empty() {
        return None;
    }
    let bucket_width = page_width / BUCKETS as f32;
    let mut coverage = vec![0u32; BUCKETS];

    for word in lines.iter().flat_map(|l| &l.words) {
        let start = ((word.x / page_width) * BUCKETS as f32).max(0.0) as usize;
        let end = (((word.x + word.width) / page_width) * BUCKETS as f32).max(0.0) as usize;
        for bucket in &mut coverage[start.min(BUCKETS - 1)..=end.min(BUCKETS - 1)] {
            *bucket += 1;
        }
    }

    let threshold = lines.len() as u32 / 10;
    let (lo, hi) = (BUCKETS * 30 / 100, BUCKETS * 70 / 100);
    let mut best: Option<(usize, usize)> = None;
    let mut gap_start = None;

    for i in lo..hi {
        if coverage[i] > threshold {
            gap_start = None;
            continue;
        }
        let start = *gap_start.get_or_insert(i);
        let len = i - start + 1;
        if best.is_none_or(|(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }

    let (start, len) = best?;
    // words must exist on both sides of the gap
    let left_used = coverage[..start].iter().any(|&c| c > threshold);
    let right_used = coverage[start + len..].iter().any(|&c| c > threshold);
    (left_used && right_used).then(|| (start as f32 + len as f32 / 2.0) * bucket_width)
}

fn make_line(words: Vec<Word>) -> Line {
    let y = words.first().map_or(0.0, |w| w.y);
    Line { words, y }
}

/// Split a line wherever the superscript state flips.
fn line_runs(line: &Line) -> Vec<String> {
    let mut runs: Vec<(bool, Vec<&str>)> = Vec::new();
    for word in &line.words {
        match runs.last_mut() {
            Some((sup, parts)) if *sup == word.is_superscript => parts.push(word.text.as_str()),
            _ => runs.push((word.is_superscript, vec![word.text.as_str()])),
        }
    }
    runs.into_iter().map(|(_, parts)| parts.join(" ")).collect()
}
