//! Product-block parsing: one ALL-CAPS title plus its body lines become
//! one or more provisional products.

use rust_decimal::Decimal;

use super::lines;
use super::{ParsedOptional, ParsedProduct};
use crate::domain::machine::Currency;

/// Join used between title, model and variant when composing display
/// names, matching the vendor document's own dash style.
const NAME_JOIN: &str = " – ";

/// One model sub-section of a block, normalized from either the
/// `MODELO:` (caps) or `Modelo:` (inline) layout.
struct Segment {
    model: String,
    spec_lines: Vec<String>,
    price_lines: Vec<String>,
    optional_lines: Vec<String>,
}

/// Parse one block into products. Tries, in order: caps `MODELO:`
/// sub-sections, inline `Modelo:` sub-sections, then a single fallback
/// product when no model marker exists.
pub(crate) fn parse_product_block(
    title: &str,
    body: &[String],
    start_index: usize,
) -> Vec<ParsedProduct> {
    if let Some((preamble, segments)) = split_caps_segments(body) {
        return build_products(title, &preamble, segments, start_index);
    }
    if let Some((common_specs, segments)) = split_inline_segments(body) {
        return build_products(title, &common_specs, segments, start_index);
    }

    let (spec_lines, price_lines, optional_lines) = split_specs_and_optionals(body);
    let priced = price_lines
        .iter()
        .find_map(|line| lines::parse_price(line).map(|price| (price, lines::currency_for(line))));
    let specs: Vec<String> = spec_lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && trimmed != "PRECIO" && !lines::is_fallback_noise(trimmed)
        })
        .map(|line| lines::clean_spec(line))
        .collect();

    vec![ParsedProduct {
        code: lines::generate_code(title, "", start_index),
        product_title: title.to_string(),
        model_name: String::new(),
        name: title.to_string(),
        category: lines::category_for_title(title),
        price: priced.map(|(price, _)| price),
        price_currency: priced.map(|(_, currency)| currency).unwrap_or_default(),
        specs,
        optionals: parse_optionals(&optional_lines),
    }]
}

/// `MODELO:` (caps) sub-sections. A repeated `MODELO: X ... U$S` line for
/// the current model is its price line, not a new section.
fn split_caps_segments(body: &[String]) -> Option<(Vec<String>, Vec<Segment>)> {
    let mut raw_segments: Vec<(String, Vec<String>)> = Vec::new();
    let mut preamble: Vec<String> = Vec::new();
    let mut current_model: Option<String> = None;
    let mut current_lines: Vec<String> = Vec::new();

    for line in body {
        let Some(captures) = lines::MODEL_CAPS_RE.captures(line) else {
            current_lines.push(line.clone());
            continue;
        };

        let without_price = lines::PRICE_RE.replace_all(&captures[1], "");
        let without_leader = lines::MODEL_DOT_LEADER_RE.replace(without_price.trim(), "");
        let model = without_leader.trim().trim_end_matches(['-', '–', '.']).trim().to_string();
        let priced = lines::has_price(line);

        if Some(&model) == current_model.as_ref() && priced {
            current_lines.push(line.clone());
            continue;
        }

        match current_model.take() {
            Some(previous) => raw_segments.push((previous, std::mem::take(&mut current_lines))),
            None => preamble = std::mem::take(&mut current_lines),
        }
        current_model = Some(model);
        if priced {
            current_lines.push(line.clone());
        }
    }
    if let Some(model) = current_model {
        raw_segments.push((model, current_lines));
    }

    if raw_segments.is_empty() {
        return None;
    }

    let segments = raw_segments
        .into_iter()
        .map(|(model, section)| {
            let (spec_lines, price_lines, optional_lines) = split_specs_and_optionals(&section);
            Segment { model, spec_lines, price_lines, optional_lines }
        })
        .collect();
    Some((preamble, segments))
}

/// `Modelo:` (inline) sub-sections, with optional sections tracked across
/// the body. Lines before the first model become shared specs.
fn split_inline_segments(body: &[String]) -> Option<(Vec<String>, Vec<Segment>)> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut common_specs: Vec<String> = Vec::new();
    let mut model: Option<String> = None;
    let mut spec_lines: Vec<String> = Vec::new();
    let mut price_lines: Vec<String> = Vec::new();
    let mut optional_lines: Vec<String> = Vec::new();
    let mut in_optionals = false;

    for line in body {
        if lines::is_optional_section(line) {
            in_optionals = true;
            continue;
        }
        if in_optionals {
            optional_lines.push(line.clone());
            continue;
        }

        if let Some(captures) = lines::MODEL_INLINE_RE.captures(line) {
            let without_price = lines::PRICE_RE.replace_all(&captures[1], "");
            let without_leader = lines::MODEL_DOT_LEADER_RE.replace(without_price.trim(), "");
            let raw_model = without_leader.trim().to_string();
            let new_model = raw_model
                .split(" - ")
                .next()
                .and_then(|piece| piece.split(NAME_JOIN).next())
                .unwrap_or(&raw_model)
                .trim()
                .to_string();
            let priced = lines::has_price(line);

            if Some(&new_model) == model.as_ref() && priced {
                price_lines.push(line.clone());
                continue;
            }

            if let Some(previous) = model.take() {
                segments.push(Segment {
                    model: previous,
                    spec_lines: std::mem::take(&mut spec_lines),
                    price_lines: std::mem::take(&mut price_lines),
                    optional_lines: std::mem::take(&mut optional_lines),
                });
                in_optionals = false;
            }
            model = Some(new_model);
            if priced {
                price_lines.push(line.clone());
            }
        } else if lines::OPTIONAL_INLINE_RE.is_match(line) {
            // "OPCIONAL: item ... U$S X.=" opens the section with its
            // first item on the same line.
            in_optionals = true;
            let rest = lines::OPTIONAL_PREFIX_RE.replace(line, "");
            let rest = rest.trim();
            if rest.chars().count() > 3 {
                optional_lines.push(rest.to_string());
            }
        } else if lines::has_price(line) || lines::is_price_on_request(line) {
            price_lines.push(line.clone());
        } else if model.is_some() {
            spec_lines.push(line.clone());
        } else {
            common_specs.push(line.clone());
        }
    }

    if let Some(last) = model {
        segments.push(Segment { model: last, spec_lines, price_lines, optional_lines });
    } else if !price_lines.is_empty() {
        // No model marker at all: the whole block is one anonymous
        // product and the shared specs belong to it.
        segments.push(Segment {
            model: String::new(),
            spec_lines: std::mem::take(&mut common_specs),
            price_lines,
            optional_lines,
        });
    }

    if segments.is_empty() {
        return None;
    }

    // A segment's own spec lines may still hide price or optional rows.
    let segments = segments
        .into_iter()
        .map(|segment| {
            let (spec_lines, extra_prices, extra_optionals) =
                split_specs_and_optionals(&segment.spec_lines);
            Segment {
                model: segment.model,
                spec_lines,
                price_lines: segment.price_lines.into_iter().chain(extra_prices).collect(),
                optional_lines: segment.optional_lines.into_iter().chain(extra_optionals).collect(),
            }
        })
        .collect();
    Some((common_specs, segments))
}

fn build_products(
    title: &str,
    preamble: &[String],
    segments: Vec<Segment>,
    start_index: usize,
) -> Vec<ParsedProduct> {
    let common_specs: Vec<String> = preamble
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !lines::has_price(trimmed)
                && !trimmed.is_empty()
                && trimmed != "PRECIO"
                && !lines::is_preamble_noise(trimmed)
        })
        .map(|line| lines::clean_spec(line))
        .collect();

    let category = lines::category_for_title(title);
    let mut products: Vec<ParsedProduct> = Vec::new();

    for segment in segments {
        let mut specs = common_specs.clone();
        specs.extend(
            segment
                .spec_lines
                .iter()
                .filter(|line| {
                    let trimmed = line.trim();
                    !trimmed.is_empty() && trimmed != "PRECIO"
                })
                .map(|line| lines::clean_spec(line)),
        );
        specs.retain(|spec| !spec.is_empty());

        let optionals = parse_optionals(&segment.optional_lines);

        let priced_lines: Vec<(String, Decimal, Currency)> = segment
            .price_lines
            .iter()
            .filter_map(|line| {
                lines::parse_price(line)
                    .map(|price| (line.clone(), price, lines::currency_for(line)))
            })
            .collect();
        let named_variants: Vec<(Decimal, Currency, String)> = priced_lines
            .iter()
            .filter_map(|(line, price, currency)| {
                lines::extract_variant_name(line).map(|variant| (*price, *currency, variant))
            })
            .collect();

        if named_variants.len() > 1 {
            // e.g. "VUELCO MANUAL" and "VUELCO HIDRAULICO" under one model
            for (price, price_currency, variant) in named_variants {
                let model = if segment.model.is_empty() {
                    variant
                } else {
                    format!("{}{NAME_JOIN}{variant}", segment.model)
                };
                products.push(ParsedProduct {
                    code: lines::generate_code(title, &model, start_index + products.len()),
                    product_title: title.to_string(),
                    model_name: model.clone(),
                    name: format!("{title}{NAME_JOIN}{model}"),
                    category: category.clone(),
                    price: Some(price),
                    price_currency,
                    specs: specs.clone(),
                    optionals: optionals.clone(),
                });
            }
        } else {
            let price = priced_lines.first().map(|(_, price, _)| *price);
            let price_currency =
                priced_lines.first().map(|(_, _, currency)| *currency).unwrap_or_default();
            let name = if segment.model.is_empty() {
                title.to_string()
            } else {
                format!("{title}{NAME_JOIN}{}", segment.model)
            };
            products.push(ParsedProduct {
                code: lines::generate_code(title, &segment.model, start_index + products.len()),
                product_title: title.to_string(),
                model_name: segment.model,
                name,
                category: category.clone(),
                price,
                price_currency,
                specs,
                optionals,
            });
        }
    }

    products
}

/// Split body lines into (specs, price lines, optional lines), switching
/// to optionals once a section marker appears.
fn split_specs_and_optionals(body: &[String]) -> (Vec<String>, Vec<String>, Vec<String>) {
    let mut spec_lines: Vec<String> = Vec::new();
    let mut price_lines: Vec<String> = Vec::new();
    let mut optional_lines: Vec<String> = Vec::new();
    let mut in_optionals = false;

    for line in body {
        if lines::is_optional_section(line) {
            in_optionals = true;
            continue;
        }
        if !in_optionals && lines::OPTIONAL_INLINE_RE.is_match(line) {
            in_optionals = true;
            let rest = lines::OPTIONAL_PREFIX_RE.replace(line, "");
            let rest = rest.trim();
            if !rest.is_empty() {
                optional_lines.push(rest.to_string());
            }
            continue;
        }
        if in_optionals {
            optional_lines.push(line.clone());
        } else if lines::has_price(line) || lines::is_price_on_request(line) {
            price_lines.push(line.clone());
        } else {
            spec_lines.push(line.clone());
        }
    }

    (spec_lines, price_lines, optional_lines)
}

/// Parse optional-item lines into named add-ons. Items may wrap across
/// lines; a bullet or a price terminates the running item.
pub(crate) fn parse_optionals(optional_lines: &[String]) -> Vec<ParsedOptional> {
    let mut optionals: Vec<ParsedOptional> = Vec::new();
    let mut buffer: Vec<String> = Vec::new();

    fn flush(buffer: &mut Vec<String>, optionals: &mut Vec<ParsedOptional>) {
        if buffer.is_empty() {
            return;
        }
        let text = buffer.join(" ");
        buffer.clear();
        let price = lines::parse_price(&text);
        let name = lines::clean_optional_name(&text);
        if name.chars().count() > 3 {
            optionals.push(ParsedOptional { name, price });
        }
    }

    for line in optional_lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let priced = lines::has_price(line);
        let bulleted = line.starts_with(lines::BULLET);

        if bulleted {
            flush(&mut buffer, &mut optionals);
            buffer.push(lines::clean_spec(line));
            if priced {
                flush(&mut buffer, &mut optionals);
            }
        } else if priced && !buffer.is_empty() {
            buffer.push(line.to_string());
            flush(&mut buffer, &mut optionals);
        } else if priced {
            let price = lines::parse_price(line);
            let name = lines::clean_optional_name(line);
            if name.chars().count() > 3 {
                optionals.push(ParsedOptional { name, price });
            }
        } else {
            buffer.push(line.to_string());
        }
    }
    flush(&mut buffer, &mut optionals);

    optionals
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_optionals, parse_product_block};

    const BULLET: char = '\u{f0d8}';

    fn body(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn block_without_model_markers_falls_back_to_single_product() {
        let products = parse_product_block(
            "ELEVADOR DE ROLLOS",
            &body(&["Levanta rollos de hasta 800 kg", "U$S 2.350.="]),
            3,
        );

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].model_name, "");
        assert_eq!(products[0].name, "ELEVADOR DE ROLLOS");
        assert_eq!(products[0].price, Some(Decimal::from(2_350)));
        assert_eq!(products[0].specs, vec!["Levanta rollos de hasta 800 kg".to_string()]);
    }

    #[test]
    fn repeated_caps_model_line_is_the_price_not_a_new_segment() {
        let products = parse_product_block(
            "PALA DE ARRASTRE NIVELADORA",
            &body(&[
                "MODELO: P.A. 200",
                &format!("{BULLET} Ancho de labor 2 metros"),
                "MODELO: P.A. 200 . . . . U$S 3.900.=",
            ]),
            1,
        );

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].model_name, "P.A. 200");
        assert_eq!(products[0].price, Some(Decimal::from(3_900)));
        assert_eq!(products[0].specs, vec!["Ancho de labor 2 metros".to_string()]);
    }

    #[test]
    fn preamble_specs_are_shared_across_inline_models() {
        let products = parse_product_block(
            "ACOPLADO RURAL VAQUERO",
            &body(&[
                "Chasis reforzado de chapa plegada",
                "Modelo: V-2 . . . U$S 2.100.=",
                "Modelo: V-3 . . . U$S 2.500.=",
            ]),
            1,
        );

        assert_eq!(products.len(), 2);
        for product in &products {
            assert_eq!(product.specs, vec!["Chasis reforzado de chapa plegada".to_string()]);
        }
        assert_eq!(products[0].model_name, "V-2");
        assert_eq!(products[1].model_name, "V-3");
        assert_eq!(products[1].price, Some(Decimal::from(2_500)));
    }

    #[test]
    fn inline_model_dash_suffix_is_dropped_from_the_model_name() {
        let products = parse_product_block(
            "ACOPLADO TANQUE",
            &body(&["Modelo: T-3000 - tanque de 3000 litros U$S 4.800.="]),
            1,
        );

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].model_name, "T-3000");
        assert_eq!(products[0].price, Some(Decimal::from(4_800)));
    }

    #[test]
    fn inline_optional_with_item_on_marker_line_is_captured() {
        let products = parse_product_block(
            "ACOPLADO RURAL PLAYO",
            &body(&[
                "Modelo: P-8",
                "U$S 3.200.=",
                "OPCIONAL: cobertor de lona . . . U$S 200.=",
            ]),
            1,
        );

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].optionals.len(), 1);
        assert_eq!(products[0].optionals[0].name, "cobertor de lona");
        assert_eq!(products[0].optionals[0].price, Some(Decimal::from(200)));
    }

    #[test]
    fn wrapped_optional_lines_join_until_a_price_appears() {
        let optionals = parse_optionals(&body(&[
            &format!("{BULLET} Kit de luces reglamentarias"),
            "con instalacion completa . . . U$S 180.=",
            &format!("{BULLET} Gato hidraulico U$S 95.="),
        ]));

        assert_eq!(optionals.len(), 2);
        assert_eq!(
            optionals[0].name,
            "Kit de luces reglamentarias con instalacion completa"
        );
        assert_eq!(optionals[0].price, Some(Decimal::from(180)));
        assert_eq!(optionals[1].name, "Gato hidraulico");
        assert_eq!(optionals[1].price, Some(Decimal::from(95)));
    }

    #[test]
    fn short_optional_names_are_discarded() {
        let optionals = parse_optionals(&body(&["eje U$S 50.="]));
        assert!(optionals.is_empty());
    }

    #[test]
    fn peso_marked_blocks_are_tagged_ars() {
        use crate::domain::machine::Currency;

        let products = parse_product_block(
            "ACOPLADO TANQUE NACIONALIZADO",
            &body(&["Modelo: T-1500", "AR$ 1.350.000.="]),
            1,
        );

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].price, Some(Decimal::from(1_350_000)));
        assert_eq!(products[0].price_currency, Currency::Ars);
    }
}
