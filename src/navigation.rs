//! The navigation bar shown at the top of every page, and at the bottom on
//! small screens.

use maud::{Markup, html};

use crate::endpoints;

/// A link in the navigation bar.
///
/// Only one link should be current at a time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!( a href=(self.url) class=(style) { (self.title) } )
    }

    fn into_mobile_html(self) -> Markup {
        let style = if self.is_current {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            bg-blue-50 px-2 py-2 text-xs font-semibold leading-tight \
            text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200"
        } else {
            "flex w-full min-w-0 items-center justify-center rounded-lg \
            px-2 py-2 text-xs font-semibold leading-tight text-gray-600 \
            hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
            dark:hover:bg-blue-900/20 dark:hover:text-blue-200"
        };

        html! {
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                span class="truncate" { (self.title) }
            }
        }
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar with the link to `active_endpoint`, if any,
    /// marked as the current page.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let pages = [
            (endpoints::EXPENSES_VIEW, "Expenses"),
            (endpoints::INCOMES_VIEW, "Incomes"),
            (endpoints::BUDGETS_VIEW, "Budgets"),
            (endpoints::SAVINGS_VIEW, "Savings"),
        ];

        let mut links: Vec<Link> = pages
            .into_iter()
            .map(|(url, title)| Link {
                url,
                title,
                is_current: active_endpoint == url,
            })
            .collect();

        links.push(Link {
            url: endpoints::LOG_OUT,
            title: "Log out",
            is_current: false,
        });

        NavBar { links }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Budgetbook"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in self.links.iter().cloned() {
                                li { (link.into_desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    div
                        class="rounded-xl border border-gray-200 bg-white/95
                        shadow-lg backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul class="grid grid-cols-5 gap-1 px-2 py-3" aria-label="Primary"
                        {
                            @for link in self.links {
                                li class="min-w-0" { (link.into_mobile_html()) }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use scraper::{Html, Selector};

    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn marks_only_the_active_page() {
        let pages = [
            endpoints::EXPENSES_VIEW,
            endpoints::INCOMES_VIEW,
            endpoints::BUDGETS_VIEW,
            endpoints::SAVINGS_VIEW,
        ];

        for page in pages {
            let nav_bar = NavBar::new(page);

            for link in nav_bar.links {
                assert_eq!(
                    link.is_current,
                    link.url == page,
                    "link {} when {page} is active",
                    link.url
                );
            }
        }
    }

    #[test]
    fn log_out_is_never_active() {
        let nav_bar = NavBar::new(endpoints::LOG_OUT);

        assert!(nav_bar.links.iter().all(|link| !link.is_current));
    }

    #[test]
    fn mobile_bar_marks_current_page() {
        let html = Html::parse_fragment(&NavBar::new(endpoints::BUDGETS_VIEW).into_html().into_string());

        let current: Vec<&str> = html
            .select(&Selector::parse("a[aria-current=page]").unwrap())
            .filter_map(|link| link.value().attr("href"))
            .collect();

        assert_eq!(current, vec![endpoints::BUDGETS_VIEW]);
    }
}
