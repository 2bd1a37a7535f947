use super::NOT_FOUND_SENTINEL;

/// Build the extraction prompt for one message.
///
/// The model sees the subject and body verbatim and is held to a
/// one-token answer: a bare number of centimetres or the not-found
/// sentinel.
pub fn build_diameter_prompt(subject: &str, body: &str) -> String {
    format!(
        r#"You extract tree trunk measurements from messages sent by volunteers.

<message>
Subject: {subject}

{body}
</message>

Find the diameter of the tree in the message above, in centimeters.

RULES:
1. If a diameter (or DBH, diameter at breast height) is given, convert it to centimeters.
2. If only a circumference is given, compute diameter = circumference / π (3.14159) and convert to centimeters.
3. Inches convert at 2.54 cm per inch; meters at 100 cm per meter.
4. Respond with ONLY the number, for example: 42.5
5. If the message contains no measurement, respond with exactly: {NOT_FOUND_SENTINEL}
6. Do not add units, words, or punctuation."#
    )
}
