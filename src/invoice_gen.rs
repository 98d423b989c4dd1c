use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::CompanyProfile;
use crate::money;
use crate::pdf::{Font, PdfPage};

const PAGE_WIDTH: f32 = 600.0;
const PAGE_HEIGHT: f32 = 800.0;
const MARGIN: f32 = 50.0;
const HEAD_FONT_SIZE: f32 = 10.0;
const BODY_FONT_SIZE: f32 = 12.0;
const RULE_GREY: f32 = 0.6;

/// Everything printed on an invoice besides the sender block.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDocument {
    pub invoice_id: Uuid,
    pub customer_name: String,
    pub customer_email: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub service_name: String,
    pub quantity: f64,
    /// Unit price in øre
    pub amount: i64,
}

impl InvoiceDocument {
    /// Sum of the lines in øre, before VAT.
    pub fn total(&self) -> i64 {
        money::sum(
            self.lines
                .iter()
                .map(|line| money::line_total(line.amount, line.quantity)),
        )
    }
}

/// Service for rendering invoices as PDF documents
pub struct InvoiceGenerator {
    company: CompanyProfile,
}

impl InvoiceGenerator {
    pub fn new(company: CompanyProfile) -> Self {
        Self { company }
    }

    /// Attachment name for an invoice
    pub fn file_name(invoice_id: Uuid) -> String {
        format!("faktura-{invoice_id}.pdf")
    }

    /// Lay out the invoice on a single page, dated `today`
    pub fn generate_pdf(&self, invoice: &InvoiceDocument, today: NaiveDate) -> Vec<u8> {
        let (page, bottom) = self.layout(invoice, today);
        if bottom < MARGIN {
            tracing::warn!(
                "invoice {} has {} lines and runs past the page margin; the tail is clipped",
                invoice.invoice_id,
                invoice.lines.len()
            );
        }
        page.finish()
    }

    /// Draws the page and returns it with the baseline of the last text row.
    fn layout(&self, invoice: &InvoiceDocument, today: NaiveDate) -> (PdfPage, f32) {
        let mut page = PdfPage::new(PAGE_WIDTH, PAGE_HEIGHT);
        let right_x = page.width() - MARGIN - 100.0;
        let mut y = page.height() - MARGIN;

        // Title
        page.text(MARGIN, y, 18.0, Font::HelveticaBold, &self.company.name);
        y -= 30.0;

        // Customer block
        let customer = [
            invoice.customer_name.clone(),
            invoice.customer_email.clone(),
            invoice.street.clone(),
            format!("{}, {}", invoice.postal_code, invoice.city),
        ];
        for (i, line) in customer.iter().enumerate() {
            page.text(MARGIN, y - 20.0 * i as f32, HEAD_FONT_SIZE, Font::Helvetica, line);
        }

        // Sender block
        let company = [
            self.company.name.clone(),
            self.company.street.clone(),
            self.company.postal.clone(),
            format!("CVR. {}", self.company.cvr),
            self.company.web.clone(),
            self.company.email.clone(),
            format!("Telefon {}", self.company.phone),
            format!("Dato: {}", today.format("%d.%m.%Y")),
        ];
        for (i, line) in company.iter().enumerate() {
            page.text(right_x, y - 20.0 * i as f32, HEAD_FONT_SIZE, Font::Helvetica, line);
        }

        y -= 180.0;

        // Table header
        for (offset, title) in [(0.0, "Ydelse"), (200.0, "Antal"), (300.0, "Enhedspris"), (400.0, "Beløb")] {
            page.text(MARGIN + offset, y, BODY_FONT_SIZE, Font::HelveticaBold, title);
        }
        y -= 10.0;
        self.rule(&mut page, y);
        y -= 20.0;

        for (i, line) in invoice.lines.iter().enumerate() {
            let cells = [
                line.service_name.clone(),
                line.quantity.to_string(),
                money::format_decimal(line.amount),
                money::format_decimal(money::line_total(line.amount, line.quantity)),
            ];
            for (offset, cell) in [0.0, 200.0, 300.0, 400.0].into_iter().zip(cells.iter()) {
                page.text(MARGIN + offset, y, BODY_FONT_SIZE, Font::Helvetica, cell);
            }
            if i + 1 < invoice.lines.len() {
                y -= 20.0;
            }
        }
        y -= 10.0;
        self.rule(&mut page, y);
        y -= 30.0;

        // Totals
        let total = invoice.total();
        let totals_x = page.width() - MARGIN - 200.0;
        page.text(
            totals_x,
            y,
            BODY_FONT_SIZE,
            Font::HelveticaBold,
            &format!("Total (ekskl. moms): {} DKK", money::format_decimal(total)),
        );
        y -= 20.0;
        page.text(
            totals_x,
            y,
            BODY_FONT_SIZE,
            Font::Helvetica,
            &format!(
                "Total (inkl. moms 25%): {} DKK",
                money::format_decimal(money::with_vat(total))
            ),
        );

        (page, y)
    }

    fn rule(&self, page: &mut PdfPage, y: f32) {
        let end = page.width() - MARGIN;
        page.line((MARGIN, y), (end, y), 0.5, RULE_GREY);
    }

    /// Plain-text body of the invoice email
    pub fn email_body(&self, customer_name: &str) -> String {
        format!(
            "Hej {customer_name},\n\n\
             Tak for din tillid til {company}. Vedhæftet finder du din faktura.\n\n\
             Har du spørgsmål, er du velkommen til at kontakte os på {email} eller telefon {phone}.\n\n\
             Med venlig hilsen\n{company}\n{web}\n",
            company = self.company.name,
            email = self.company.email,
            phone = self.company.phone,
            web = self.company.web,
        )
    }

    pub fn email_subject(&self) -> String {
        format!("Faktura fra {}", self.company.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    fn document() -> InvoiceDocument {
        InvoiceDocument {
            invoice_id: Uuid::nil(),
            customer_name: "Jens Jensen".into(),
            customer_email: "jens@example.dk".into(),
            street: "Nørregade 7".into(),
            postal_code: "1165".into(),
            city: "København".into(),
            lines: vec![
                InvoiceLine {
                    service_name: "Maling".into(),
                    quantity: 2.0,
                    amount: 45000,
                },
                InvoiceLine {
                    service_name: "Spartling".into(),
                    quantity: 1.5,
                    amount: 20000,
                },
            ],
        }
    }

    #[test]
    fn totals_before_and_after_vat() {
        let doc = document();
        assert_eq!(doc.total(), 120000);
        assert_eq!(money::with_vat(doc.total()), 150000);
    }

    #[test]
    fn renders_layout() {
        let generator = InvoiceGenerator::new(CompanyProfile::default());
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let bytes = generator.generate_pdf(&document(), today);

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(contains(&bytes, "BT /F2 18 Tf 50 750 Td (RAH Maler) Tj ET"));
        assert!(contains(&bytes, "BT /F1 10 Tf 50 720 Td (Jens Jensen) Tj ET"));
        assert!(contains(&bytes, "BT /F1 10 Tf 50 660 Td (1165, K\\370benhavn) Tj ET"));
        assert!(contains(&bytes, "BT /F1 10 Tf 450 600 Td (Telefon 70 10 20 31) Tj ET"));
        assert!(contains(&bytes, "(Dato: 03.06.2024)"));
        assert!(contains(&bytes, "BT /F2 12 Tf 450 540 Td (Bel\\370b) Tj ET"));
        assert!(contains(&bytes, "BT /F1 12 Tf 250 510 Td (2) Tj ET"));
        assert!(contains(&bytes, "BT /F1 12 Tf 450 490 Td (300.00) Tj ET"));
        assert!(contains(&bytes, "(Total \\(ekskl. moms\\): 1200.00 DKK)"));
        assert!(contains(&bytes, "(Total \\(inkl. moms 25%\\): 1500.00 DKK)"));
    }

    #[test]
    fn long_invoices_run_past_the_margin() {
        let generator = InvoiceGenerator::new(CompanyProfile::default());
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        let (_, bottom) = generator.layout(&document(), today);
        assert_eq!(bottom, 430.0);

        let mut long = document();
        long.lines = (0..40).map(|_| long.lines[0].clone()).collect();
        let (_, bottom) = generator.layout(&long, today);
        assert!(bottom < MARGIN);

        let bytes = generator.generate_pdf(&long, today);
        assert!(bytes.ends_with(b"%%EOF\n"));
    }

    #[test]
    fn attachment_name_and_subject() {
        let id = Uuid::nil();
        assert_eq!(
            InvoiceGenerator::file_name(id),
            "faktura-00000000-0000-0000-0000-000000000000.pdf"
        );
        let generator = InvoiceGenerator::new(CompanyProfile::default());
        assert_eq!(generator.email_subject(), "Faktura fra RAH Maler");
        assert!(generator.email_body("Jens").starts_with("Hej Jens,"));
    }
}
